//! Navigation controller.
//!
//! # Responsibility
//! - Hold the current view identifier and mirror it into the key store.
//! - Notify subscribers synchronously on every navigation request.
//!
//! # Invariants
//! - `current` is always a registered view.
//! - Corrupt or unknown persisted values restore to the default view.
//! - Persistence failures never reach the caller; memory stays authoritative.
//! - Re-navigating to the active view still notifies subscribers.

use crate::store::KeyStore;
use crate::view::{parse_view_id, ViewId, ViewParseError};
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Navigation request errors. All of them are caller mistakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    UnknownView(ViewParseError),
    NotRegistered(ViewId),
    /// The onboarding gate owns the screen.
    Suppressed(ViewId),
}

impl Display for NavigationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownView(err) => write!(f, "{err}"),
            Self::NotRegistered(view) => write!(f, "view is not registered: {view}"),
            Self::Suppressed(view) => {
                write!(f, "navigation to {view} suppressed while onboarding is active")
            }
        }
    }
}

impl Error for NavigationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownView(err) => Some(err),
            Self::NotRegistered(_) | Self::Suppressed(_) => None,
        }
    }
}

/// One applied navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationChange {
    pub previous: ViewId,
    pub current: ViewId,
}

impl NavigationChange {
    /// Whether the request targeted the view that was already active.
    pub fn is_repeat(&self) -> bool {
        self.previous == self.current
    }
}

type NavigationListener = Box<dyn FnMut(&NavigationChange)>;

/// Current-view state machine.
pub struct NavigationController {
    current: ViewId,
    known: BTreeSet<ViewId>,
    store: Arc<dyn KeyStore>,
    key: String,
    listeners: Vec<NavigationListener>,
    persist_failures: u64,
}

impl NavigationController {
    /// Restores the last persisted view, falling back to `default_view`.
    ///
    /// A corrupt persisted value is overwritten with the fallback.
    pub fn restore(
        store: Arc<dyn KeyStore>,
        key: impl Into<String>,
        known: impl IntoIterator<Item = ViewId>,
        default_view: ViewId,
    ) -> Self {
        let key = key.into();
        let known: BTreeSet<ViewId> = known.into_iter().collect();

        let persisted = match store.get(key.as_str()) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=navigation_restore module=navigation status=fallback reason=store_error error={err}"
                );
                None
            }
        };

        let mut controller = Self {
            current: default_view,
            known,
            store,
            key,
            listeners: Vec::new(),
            persist_failures: 0,
        };

        let Some(raw) = persisted else {
            info!(
                "event=navigation_restore module=navigation status=ok source=default view={default_view}"
            );
            return controller;
        };

        match parse_view_id(raw.as_str()) {
            Ok(view) if controller.known.contains(&view) => {
                controller.current = view;
                info!(
                    "event=navigation_restore module=navigation status=ok source=store view={view}"
                );
            }
            Ok(view) => {
                warn!(
                    "event=navigation_restore module=navigation status=fallback reason=not_registered view={view} fallback={default_view}"
                );
                controller.persist();
            }
            Err(err) => {
                warn!(
                    "event=navigation_restore module=navigation status=fallback reason=corrupt error={err} fallback={default_view}"
                );
                controller.persist();
            }
        }
        controller
    }

    pub fn current(&self) -> ViewId {
        self.current
    }

    /// Number of persistence writes that failed since restore.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// Registers a synchronous subscriber.
    pub fn subscribe(&mut self, listener: impl FnMut(&NavigationChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Sets `current = target`, persists it and notifies subscribers.
    ///
    /// # Errors
    /// - `NavigationError::NotRegistered` when `target` has no registry entry.
    pub fn navigate(&mut self, target: ViewId) -> Result<NavigationChange, NavigationError> {
        if !self.known.contains(&target) {
            warn!("event=navigate module=navigation status=error reason=not_registered to={target}");
            return Err(NavigationError::NotRegistered(target));
        }

        let change = NavigationChange {
            previous: self.current,
            current: target,
        };
        self.current = target;
        self.persist();

        info!(
            "event=navigate module=navigation status=ok from={} to={} repeat={}",
            change.previous,
            change.current,
            change.is_repeat()
        );
        for listener in &mut self.listeners {
            listener(&change);
        }
        Ok(change)
    }

    /// Navigates to a view named by its persisted token.
    pub fn navigate_token(&mut self, token: &str) -> Result<NavigationChange, NavigationError> {
        let target = parse_view_id(token).map_err(|err| {
            warn!("event=navigate module=navigation status=error reason=unknown_view error={err}");
            NavigationError::UnknownView(err)
        })?;
        self.navigate(target)
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.set(self.key.as_str(), self.current.as_str()) {
            self.persist_failures += 1;
            warn!(
                "event=navigation_persist module=navigation status=error view={} error={err}",
                self.current
            );
        }
    }
}
