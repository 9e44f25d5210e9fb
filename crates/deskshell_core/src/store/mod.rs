//! External collaborator contracts consumed by the shell.
//!
//! # Responsibility
//! - Define the key/value, profile, feature flag and startup settings seams.
//! - Keep storage engines swappable behind object-safe traits.
//!
//! # Invariants
//! - Implementations must be `Send + Sync`; reads run on blocking workers.
//! - Store failures are reported, never panicked; the shell decides fallbacks.
//!
//! # See also
//! - `store::sqlite` for the on-disk implementation.

use crate::db::DbError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryFlagStore, MemoryKeyStore, MemoryProfileStore, NoopStartupSettings};
pub use sqlite::SqliteShellStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure shared by every collaborator contract.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Unavailable(String),
    Unsupported(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
            Self::Unsupported(operation) => write!(f, "store does not support `{operation}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) | Self::Unsupported(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Saved user identity; its absence means first run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Runtime-toggleable experimental feature switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub alpha_enabled: bool,
}

/// String-keyed values that survive process restarts.
///
/// Last write wins; no transactional guarantee is required.
pub trait KeyStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// Source of the user's saved identity.
pub trait ProfileStore: Send + Sync {
    /// Returns `None` on first run.
    fn get_profile(&self) -> StoreResult<Option<UserProfile>>;
}

/// Source of experimental feature enablement.
pub trait FeatureFlagStore: Send + Sync {
    fn get_alpha_enabled(&self) -> StoreResult<bool>;

    fn set_alpha_enabled(&self, _enabled: bool) -> StoreResult<()> {
        Err(StoreError::Unsupported("set_alpha_enabled"))
    }
}

/// One-shot launch side effect; the result is not consumed by the shell.
pub trait StartupSettingsApplier: Send + Sync {
    fn apply(&self) -> StoreResult<()>;
}
