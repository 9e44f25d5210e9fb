//! Deferred load boundary state machine.
//!
//! # Responsibility
//! - Track one lazily loaded panel from first activation to a cached factory.
//! - Hand the caller the load future; running it is the caller's concern.
//!
//! # Invariants
//! - `Unloaded -> Loading -> Ready | Failed`; no other transition happens
//!   on its own.
//! - `Ready` is terminal: the factory is cached and never reloaded.
//! - `Failed` only leaves through an explicit `retry`.

use super::panel::PanelFactory;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future resolving a deferred panel's factory.
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<PanelFactory, PanelLoadError>> + Send>>;

/// Produces a fresh load future for each attempt.
pub type PanelLoader = Arc<dyn Fn() -> LoadFuture + Send + Sync>;

/// Wraps an async closure as a [`PanelLoader`].
pub fn panel_loader<F, Fut>(load: F) -> PanelLoader
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PanelFactory, PanelLoadError>> + Send + 'static,
{
    Arc::new(move || Box::pin(load()) as LoadFuture)
}

/// Observable phase of a deferred entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl LoadPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Load rejection reported to the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelLoadError {
    Rejected(String),
    /// The load task stopped without producing a result.
    Aborted(String),
}

impl Display for PanelLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "panel load rejected: {reason}"),
            Self::Aborted(reason) => write!(f, "panel load aborted: {reason}"),
        }
    }
}

impl Error for PanelLoadError {}

enum Phase {
    Unloaded,
    Loading,
    Ready(PanelFactory),
    Failed(PanelLoadError),
}

/// Per-entry deferred load state.
pub struct DeferredLoadState {
    loader: PanelLoader,
    phase: Phase,
    attempts: u32,
}

impl DeferredLoadState {
    pub fn new(loader: PanelLoader) -> Self {
        Self {
            loader,
            phase: Phase::Unloaded,
            attempts: 0,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        match self.phase {
            Phase::Unloaded => LoadPhase::Unloaded,
            Phase::Loading => LoadPhase::Loading,
            Phase::Ready(_) => LoadPhase::Ready,
            Phase::Failed(_) => LoadPhase::Failed,
        }
    }

    /// Number of load futures handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn factory(&self) -> Option<PanelFactory> {
        match &self.phase {
            Phase::Ready(factory) => Some(Arc::clone(factory)),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&PanelLoadError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// First activation: `Unloaded -> Loading`.
    ///
    /// Returns `None` when a load was already attempted.
    pub fn activate(&mut self) -> Option<LoadFuture> {
        if matches!(self.phase, Phase::Unloaded) {
            Some(self.start())
        } else {
            None
        }
    }

    /// Explicit retry: `Failed -> Loading`. No-op in every other phase.
    pub fn retry(&mut self) -> Option<LoadFuture> {
        if matches!(self.phase, Phase::Failed(_)) {
            Some(self.start())
        } else {
            None
        }
    }

    /// Records the load outcome. Ignored unless currently `Loading`.
    pub fn complete(&mut self, result: Result<PanelFactory, PanelLoadError>) -> bool {
        if !matches!(self.phase, Phase::Loading) {
            return false;
        }
        self.phase = match result {
            Ok(factory) => Phase::Ready(factory),
            Err(err) => Phase::Failed(err),
        };
        true
    }

    fn start(&mut self) -> LoadFuture {
        self.phase = Phase::Loading;
        self.attempts += 1;
        (self.loader)()
    }
}
