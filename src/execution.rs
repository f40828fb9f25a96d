//! Per-unit-of-work execution context
//!
//! An [`ExecutionContext`] is an explicit key-value property store scoped to
//! one logical unit of work (one request or job). It replaces an ambient,
//! process-global context: callers create one context per inbound unit of
//! work and pass it by reference through the call chain. Concurrent
//! executions therefore never see each other's properties, and scoped
//! overrides (see [`crate::queue_settings`]) nest sequentially within one
//! context via save/restore.
//!
//! Values are stored type-erased and read back through a typed getter, which
//! returns `None` both for missing keys and for values of a different type.

use crate::identifiers::ExecutionId;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::any::Any;

/// Property store for one logical unit of work
pub struct ExecutionContext {
    id: ExecutionId,
    properties: Mutex<FxHashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("properties", &self.properties.lock().len())
            .finish()
    }
}

impl ExecutionContext {
    /// Create a context with a fresh execution identity
    pub fn new() -> Self {
        Self::with_id(ExecutionId::new())
    }

    /// Create a context for an externally assigned execution identity
    pub fn with_id(id: ExecutionId) -> Self {
        Self {
            id,
            properties: Mutex::new(FxHashMap::default()),
        }
    }

    /// The execution identity this context belongs to
    pub fn id(&self) -> ExecutionId {
        self.id
    }

    /// Read a property, if present and of the requested type
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.properties
            .lock()
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Set a property, replacing any previous value under the key
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.properties.lock().insert(key.into(), Box::new(value));
    }

    /// Remove a property; returns whether a value was present
    pub fn remove(&self, key: &str) -> bool {
        self.properties.lock().remove(key).is_some()
    }

    /// Whether a property is set under the key, regardless of type
    pub fn contains(&self, key: &str) -> bool {
        self.properties.lock().contains_key(key)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
