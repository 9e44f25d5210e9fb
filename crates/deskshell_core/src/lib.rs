//! Core of the desktop shell.
//! Owns view routing, onboarding gating, deferred panel loading and the
//! persistent background panel; panels and storage engines plug in from
//! outside.

pub mod config;
pub mod db;
pub mod debug_registry;
pub mod logging;
pub mod registry;
pub mod shell;
pub mod store;
pub mod view;

pub use config::{ConfigError, ShellConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use registry::{
    panel_factory, panel_loader, Layout, LoadMode, LoadPhase, Panel, PanelContext, PanelFactory,
    PanelLoadError, RegistryEntry, RegistryError, Resolution, ViewRegistry,
};
pub use shell::{
    ContentFrame, FlagToggle, NavigationChange, NavigationError, Navigator, Screen, ScreenOwner,
    Shell, ShellError, ShellServices,
};
pub use store::{
    FeatureFlagStore, FeatureFlags, KeyStore, ProfileStore, SqliteShellStore,
    StartupSettingsApplier, StoreError, StoreResult, UserProfile,
};
pub use view::{parse_view_id, ViewId, ViewParseError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
