//! Startup coordinator.
//!
//! # Responsibility
//! - Issue the profile, feature flag and startup settings reads concurrently.
//! - Return as soon as the profile decision is known.
//!
//! # Invariants
//! - Flag and settings work never delays the profile result.
//! - A missing flag store, a failed flag read or a crashed worker leaves
//!   `alpha_enabled = false`.

use super::events::ShellEvent;
use crate::store::{
    FeatureFlagStore, FeatureFlags, KeyStore, ProfileStore, StartupSettingsApplier, StoreError,
    StoreResult, UserProfile,
};
use log::{info, warn};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

/// External collaborators wired into the shell.
#[derive(Clone)]
pub struct ShellServices {
    pub key_store: Arc<dyn KeyStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub flags: Option<Arc<dyn FeatureFlagStore>>,
    pub startup_settings: Option<Arc<dyn StartupSettingsApplier>>,
}

impl ShellServices {
    pub fn new(key_store: Arc<dyn KeyStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            key_store,
            profiles,
            flags: None,
            startup_settings: None,
        }
    }

    pub fn with_flags(mut self, flags: Arc<dyn FeatureFlagStore>) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_startup_settings(mut self, applier: Arc<dyn StartupSettingsApplier>) -> Self {
        self.startup_settings = Some(applier);
        self
    }
}

/// Launches all three startup reads and waits for the profile only.
pub(crate) async fn run_startup(
    runtime: &Handle,
    services: &ShellServices,
    events: UnboundedSender<ShellEvent>,
) -> StoreResult<Option<UserProfile>> {
    if let Some(store) = services.flags.clone() {
        spawn_flag_lookup(runtime, store, events);
    }
    if let Some(applier) = services.startup_settings.clone() {
        spawn_startup_settings(runtime, applier);
    }

    let profiles = Arc::clone(&services.profiles);
    match runtime.spawn_blocking(move || profiles.get_profile()).await {
        Ok(result) => result,
        Err(err) => Err(StoreError::Unavailable(format!(
            "profile lookup worker failed: {err}"
        ))),
    }
}

fn spawn_flag_lookup(
    runtime: &Handle,
    store: Arc<dyn FeatureFlagStore>,
    events: UnboundedSender<ShellEvent>,
) {
    let lookup = runtime.spawn_blocking(move || store.get_alpha_enabled());
    runtime.spawn(async move {
        match lookup.await {
            Ok(Ok(alpha_enabled)) => {
                info!("event=feature_flags module=startup status=ok alpha_enabled={alpha_enabled}");
                let _ = events.send(ShellEvent::FlagsResolved(FeatureFlags { alpha_enabled }));
            }
            Ok(Err(err)) => {
                warn!("event=feature_flags module=startup status=fallback alpha_enabled=false error={err}");
            }
            Err(err) => {
                warn!("event=feature_flags module=startup status=fallback alpha_enabled=false error={err}");
            }
        }
    });
}

fn spawn_startup_settings(runtime: &Handle, applier: Arc<dyn StartupSettingsApplier>) {
    let task = runtime.spawn_blocking(move || applier.apply());
    runtime.spawn(async move {
        match task.await {
            Ok(Ok(())) => info!("event=startup_settings module=startup status=ok"),
            Ok(Err(err)) => warn!("event=startup_settings module=startup status=error error={err}"),
            Err(err) => warn!("event=startup_settings module=startup status=error error={err}"),
        }
    });
}
