//! Development-only diagnostic handles.
//!
//! Handles are published process-wide so a debugger or REPL can reach live
//! state. Outside development mode every call is inert.

use log::debug;
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared diagnostic handle.
pub type DebugHandle = Arc<dyn Any + Send + Sync>;

static DEBUG_REGISTRY: Lazy<Mutex<BTreeMap<String, DebugHandle>>> =
    Lazy::new(|| Mutex::new(BTreeMap::new()));

fn registry() -> MutexGuard<'static, BTreeMap<String, DebugHandle>> {
    DEBUG_REGISTRY
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Publishes `handle` under `name` when `dev_mode` is on.
///
/// Returns whether the handle was published.
pub fn expose(dev_mode: bool, name: &str, handle: DebugHandle) -> bool {
    if !dev_mode {
        return false;
    }
    registry().insert(name.to_string(), handle);
    debug!("event=debug_expose module=debug_registry status=ok name={name}");
    true
}

pub fn lookup(name: &str) -> Option<DebugHandle> {
    registry().get(name).cloned()
}

/// Looks up a handle and downcasts it to its concrete type.
pub fn lookup_as<T: Any + Send + Sync>(name: &str) -> Option<Arc<T>> {
    lookup(name)?.downcast::<T>().ok()
}
