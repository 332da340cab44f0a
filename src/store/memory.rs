//! In-memory key/value store.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyValueStore, StoreError};

/// In-memory store.
///
/// Values live as long as the store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, u32>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a single preset value.
    pub fn with_value(key: impl Into<String>, value: u32) -> Self {
        let store = Self::new();
        store.insert(key, value);
        store
    }

    /// Set a value without going through the async contract.
    pub fn insert(&self, key: impl Into<String>, value: u32) {
        self.lock().insert(key.into(), value);
    }

    /// Current value, if any.
    pub fn value(&self, key: &str) -> Option<u32> {
        self.lock().get(key).copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, u32>> {
        // A panic while holding the lock cannot leave a half-written u32.
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: u32) -> Result<(), StoreError> {
        self.insert(key, value);
        Ok(())
    }
}
