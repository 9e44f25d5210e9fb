//! In-process store implementations.
//!
//! Used by tests and by hosts that do not need restart persistence. A single
//! `MemoryKeyStore` shared between two shells behaves like one persisted file.

use super::{
    FeatureFlagStore, KeyStore, ProfileStore, StartupSettingsApplier, StoreError, StoreResult,
    UserProfile,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Key/value store backed by a sorted map.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    entries: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        lock(&store.entries).insert(key.to_string(), value.to_string());
        store
    }

    /// Makes every subsequent `set` fail, simulating a broken disk.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Profile store holding at most one profile.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profile: Mutex<Option<UserProfile>>,
    fail_reads: AtomicBool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        let store = Self::default();
        store.save_profile(profile);
        store
    }

    /// Writes the profile, as the onboarding flow does before completing.
    pub fn save_profile(&self, profile: UserProfile) {
        *lock(&self.profile) = Some(profile);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get_profile(&self) -> StoreResult<Option<UserProfile>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("profile reads disabled".to_string()));
        }
        Ok(lock(&self.profile).clone())
    }
}

/// Feature flag store with an in-memory alpha switch.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    alpha_enabled: AtomicBool,
}

impl MemoryFlagStore {
    pub fn new(alpha_enabled: bool) -> Self {
        Self {
            alpha_enabled: AtomicBool::new(alpha_enabled),
        }
    }
}

impl FeatureFlagStore for MemoryFlagStore {
    fn get_alpha_enabled(&self) -> StoreResult<bool> {
        Ok(self.alpha_enabled.load(Ordering::SeqCst))
    }

    fn set_alpha_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.alpha_enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

/// Startup applier that only counts invocations.
#[derive(Debug, Default)]
pub struct NoopStartupSettings {
    applied: AtomicUsize,
}

impl NoopStartupSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied_count(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }
}

impl StartupSettingsApplier for NoopStartupSettings {
    fn apply(&self) -> StoreResult<()> {
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
