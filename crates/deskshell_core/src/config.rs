//! Shell configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Key store entry holding the active view.
pub const DEFAULT_ACTIVE_VIEW_KEY: &str = "active_page";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub active_view_key: String,
    /// Enables the process-wide debug registry.
    pub dev_mode: bool,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            active_view_key: DEFAULT_ACTIVE_VIEW_KEY.to_string(),
            dev_mode: cfg!(debug_assertions),
            log_level: default_log_level().to_string(),
            log_dir: None,
            database_path: None,
        }
    }
}

impl ShellConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(raw.as_str())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active_view_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "active_view_key must not be empty".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read shell config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse shell config: {err}"),
            Self::Invalid(message) => write!(f, "invalid shell config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
