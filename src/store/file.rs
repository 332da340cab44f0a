//! File-based key/value store.
//!
//! Each key is a file under the store directory holding the decimal value.
//! Writes go to a temporary file that is synced and then renamed over the
//! old one, so a crash leaves either the previous or the new value.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{KeyValueStore, StoreError};

/// File-based store.
///
/// # Example
///
/// ```ignore
/// use smpp_esme::store::FileStore;
///
/// let store = FileStore::open("/var/lib/esme").await?;
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open<P: Into<PathBuf>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "opened file store");
        Ok(Self { dir })
    }

    /// Directory holding the key files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        let path = self.path_for(key)?;
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let trimmed = contents.trim();
        trimmed
            .parse::<u32>()
            .map(Some)
            .map_err(|_| StoreError::Corrupt {
                key: key.to_string(),
                value: trimmed.to_string(),
            })
    }

    async fn set(&self, key: &str, value: u32) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(value.to_string().as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_dir(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "smpp-esme-{name}-{}-{n}",
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = scratch_dir("reopen");
        let store = FileStore::open(&dir).await.unwrap();
        assert_eq!(store.get("smpp_last_sequence_number").await.unwrap(), None);

        store.set("smpp_last_sequence_number", 41).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&dir).await.unwrap();
        assert_eq!(
            reopened.get("smpp_last_sequence_number").await.unwrap(),
            Some(41)
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = scratch_dir("keys");
        let store = FileStore::open(&dir).await.unwrap();
        for key in ["../escape", "a/b", "", ".hidden"] {
            assert!(
                matches!(store.set(key, 1).await, Err(StoreError::InvalidKey(_))),
                "{key:?}"
            );
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_value_is_reported() {
        let dir = scratch_dir("corrupt");
        let store = FileStore::open(&dir).await.unwrap();
        std::fs::write(dir.join("seq"), "not a number").unwrap();

        assert!(matches!(
            store.get("seq").await,
            Err(StoreError::Corrupt { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
