// ABOUTME: Durable SMPP sequence number allocation backed by a key/value store
// ABOUTME: Numbers survive restarts and wrap back to 1 one allocation after passing 0xFFFF0000

use crate::client::error::EsmeResult;
use crate::store::KeyValueStore;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Stored values above this restart numbering on the following allocation.
pub const ROLLOVER_THRESHOLD: u32 = 0xFFFF_0000;

/// Store key holding the last issued sequence number.
pub const DEFAULT_SEQUENCE_KEY: &str = "smpp_last_sequence_number";

/// Allocates sequence numbers through a durable store.
///
/// Every allocation reads the last issued value, derives the next one and
/// writes it back before returning; nothing is cached in process. The
/// read-modify-write runs under an async mutex so two callers sharing an
/// allocator never observe the same stored value. Allocators in other
/// processes sharing the key are only serialized if the store itself is.
///
/// ```text
/// stored     next
/// absent  -> 1
/// 41      -> 42
/// 0xFFFF0000 -> 0xFFFF0001
/// 0xFFFF0001 -> 1
/// ```
#[derive(Debug)]
pub struct SequenceAllocator<S> {
    store: S,
    key: String,
    lock: Mutex<()>,
}

impl<S: KeyValueStore> SequenceAllocator<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_SEQUENCE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            lock: Mutex::new(()),
        }
    }

    /// Next sequence number, persisted before it is returned.
    ///
    /// Fails with `StoreUnavailable` when the store cannot be read or
    /// written; the stored value is unchanged in that case.
    pub async fn next_sequence(&self) -> EsmeResult<u32> {
        let _guard = self.lock.lock().await;

        let last = self.store.get(&self.key).await?.unwrap_or(0);
        let base = if last > ROLLOVER_THRESHOLD {
            info!(last, "sequence number rolled over");
            0
        } else {
            last
        };
        let next = base + 1;

        self.store.set(&self.key, next).await?;
        debug!(sequence_number = next, "allocated sequence number");
        Ok(next)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::EsmeError;
    use crate::store::{MemoryStore, StoreError};

    struct DownStore;

    impl KeyValueStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<u32>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: u32) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn fresh_store_counts_from_one() {
        let allocator = SequenceAllocator::new(MemoryStore::new());
        assert_eq!(allocator.next_sequence().await.unwrap(), 1);
        assert_eq!(allocator.next_sequence().await.unwrap(), 2);
        assert_eq!(allocator.store().value(DEFAULT_SEQUENCE_KEY), Some(2));
    }

    #[tokio::test]
    async fn rollover_is_one_allocation_late() {
        let store = MemoryStore::with_value(DEFAULT_SEQUENCE_KEY, ROLLOVER_THRESHOLD);
        let allocator = SequenceAllocator::new(store);
        assert_eq!(allocator.next_sequence().await.unwrap(), 0xFFFF_0001);
        assert_eq!(allocator.next_sequence().await.unwrap(), 1);
        assert_eq!(allocator.next_sequence().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn custom_key_is_used() {
        let allocator = SequenceAllocator::with_key(MemoryStore::new(), "esme_a");
        allocator.next_sequence().await.unwrap();
        assert_eq!(allocator.key(), "esme_a");
        assert_eq!(allocator.store().value("esme_a"), Some(1));
        assert_eq!(allocator.store().value(DEFAULT_SEQUENCE_KEY), None);
    }

    #[tokio::test]
    async fn unreachable_store_is_reported() {
        let allocator = SequenceAllocator::new(DownStore);
        assert!(matches!(
            allocator.next_sequence().await,
            Err(EsmeError::StoreUnavailable(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn interleaved_allocations_are_distinct() {
        let allocator = SequenceAllocator::new(MemoryStore::new());
        let (a, b, c, d) = tokio::join!(
            allocator.next_sequence(),
            allocator.next_sequence(),
            allocator.next_sequence(),
            allocator.next_sequence(),
        );
        let mut seen = vec![a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }
}
