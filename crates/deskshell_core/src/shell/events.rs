//! Queued state updates and the handles panels use to request them.
//!
//! Panels never mutate the shell directly. Their requests, and the results of
//! background work, land in one queue that the shell drains in order.

use super::navigation::NavigationError;
use crate::registry::{PanelFactory, PanelLoadError};
use crate::store::FeatureFlags;
use crate::view::{parse_view_id, ViewId};
use tokio::sync::mpsc::UnboundedSender;

/// One queued state update.
pub(crate) enum ShellEvent {
    Navigate(ViewId),
    SetAlphaEnabled(bool),
    FlagsResolved(FeatureFlags),
    LoadFinished {
        view: ViewId,
        result: Result<PanelFactory, PanelLoadError>,
    },
}

impl ShellEvent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Navigate(_) => "navigate",
            Self::SetAlphaEnabled(_) => "set_alpha_enabled",
            Self::FlagsResolved(_) => "flags_resolved",
            Self::LoadFinished { .. } => "load_finished",
        }
    }
}

/// Navigation callback handed to every panel.
#[derive(Debug, Clone)]
pub struct Navigator {
    sender: UnboundedSender<ShellEvent>,
}

impl Navigator {
    pub(crate) fn new(sender: UnboundedSender<ShellEvent>) -> Self {
        Self { sender }
    }

    /// Queues a transition to `view`.
    ///
    /// Returns `false` once the shell has been dropped.
    pub fn request(&self, view: ViewId) -> bool {
        self.sender.send(ShellEvent::Navigate(view)).is_ok()
    }

    /// Queues a transition named by its persisted token.
    ///
    /// # Errors
    /// - `NavigationError::UnknownView` when the token is outside the closed set.
    pub fn request_token(&self, token: &str) -> Result<bool, NavigationError> {
        let view = parse_view_id(token).map_err(NavigationError::UnknownView)?;
        Ok(self.request(view))
    }
}

/// Feature flag setter; only the settings entry receives one.
#[derive(Debug, Clone)]
pub struct FlagToggle {
    sender: UnboundedSender<ShellEvent>,
}

impl FlagToggle {
    pub(crate) fn new(sender: UnboundedSender<ShellEvent>) -> Self {
        Self { sender }
    }

    pub fn set_alpha_enabled(&self, enabled: bool) -> bool {
        self.sender
            .send(ShellEvent::SetAlphaEnabled(enabled))
            .is_ok()
    }
}
