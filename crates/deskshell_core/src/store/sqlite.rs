//! SQLite-backed implementation of every shell store contract.
//!
//! # Responsibility
//! - Persist the active view and other small keyed values (`kv_entries`).
//! - Persist the single user profile row (`personal_info`).
//! - Persist the alpha feature switch as a keyed value.
//!
//! # Invariants
//! - A profile row with a blank name is reported as absent.
//! - One connection is shared behind a mutex; calls never interleave.

use super::{FeatureFlagStore, KeyStore, ProfileStore, StoreResult, UserProfile};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Key under which the alpha feature switch is stored.
pub const ALPHA_FEATURES_KEY: &str = "alpha_features_enabled";

/// Shell store over one SQLite connection.
pub struct SqliteShellStore {
    conn: Mutex<Connection>,
}

impl SqliteShellStore {
    /// Opens (or creates) the store file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Writes the single profile row; the onboarding flow calls this before
    /// signalling completion.
    pub fn save_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO personal_info (id, name, updated_at)
             VALUES (1, ?1, strftime('%s', 'now') * 1000)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at;",
            params![profile.name.as_str()],
        )?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyStore for SqliteShellStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn().execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

impl ProfileStore for SqliteShellStore {
    fn get_profile(&self) -> StoreResult<Option<UserProfile>> {
        let name = self
            .conn()
            .query_row("SELECT name FROM personal_info WHERE id = 1;", [], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;

        Ok(name
            .filter(|name| !name.trim().is_empty())
            .map(UserProfile::new))
    }
}

impl FeatureFlagStore for SqliteShellStore {
    fn get_alpha_enabled(&self) -> StoreResult<bool> {
        Ok(self.get(ALPHA_FEATURES_KEY)?.as_deref() == Some("true"))
    }

    fn set_alpha_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.set(ALPHA_FEATURES_KEY, if enabled { "true" } else { "false" })
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteShellStore;
    use crate::store::{FeatureFlagStore, KeyStore, ProfileStore, UserProfile};

    #[test]
    fn missing_key_reads_as_none() {
        let store = SqliteShellStore::open_in_memory().expect("open store");
        assert_eq!(store.get("active_page").expect("read"), None);
    }

    #[test]
    fn set_overwrites_existing_value() {
        let store = SqliteShellStore::open_in_memory().expect("open store");
        store.set("active_page", "settings").expect("first write");
        store.set("active_page", "notebooks").expect("second write");
        assert_eq!(
            store.get("active_page").expect("read"),
            Some("notebooks".to_string())
        );
    }

    #[test]
    fn blank_profile_name_counts_as_absent() {
        let store = SqliteShellStore::open_in_memory().expect("open store");
        store
            .save_profile(&UserProfile::new("   "))
            .expect("save blank profile");
        assert_eq!(store.get_profile().expect("read"), None);

        store
            .save_profile(&UserProfile::new("Ana"))
            .expect("save profile");
        assert_eq!(
            store.get_profile().expect("read"),
            Some(UserProfile::new("Ana"))
        );
    }

    #[test]
    fn alpha_flag_defaults_to_false_and_persists() {
        let store = SqliteShellStore::open_in_memory().expect("open store");
        assert!(!store.get_alpha_enabled().expect("read flag"));
        store.set_alpha_enabled(true).expect("write flag");
        assert!(store.get_alpha_enabled().expect("read flag"));
    }
}
