//! Durable key/value storage behind the sequence allocator.
//!
//! The session only needs `get` and `set` on integer values, so the contract
//! stays that narrow. Anything offering those two calls (Redis, a database
//! row, a file) can back sequence numbering.
//!
//! # Built-in Implementations
//!
//! - [`MemoryStore`] - process-local map, for tests and single-run tools
//! - [`FileStore`] - one file per key, replaced atomically on every write

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use thiserror::Error;

/// Key/value storage error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value is not an unsigned 32-bit integer.
    #[error("corrupt value for key '{key}': {value:?}")]
    Corrupt { key: String, value: String },

    /// The key cannot be represented by this backend.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

/// Minimal durable store contract.
///
/// Implement this trait to back sequence numbering with an external service
/// (e.g., Redis, a database row).
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: u32) -> Result<(), StoreError>;
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: u32) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }
}
