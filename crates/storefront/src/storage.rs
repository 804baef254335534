//! Client-local key/value storage.
//!
//! Mirrors the browser's `localStorage`: string slots addressed by a string
//! key. The file backend keeps every slot in one JSON object on disk and
//! rewrites it through a temp file plus rename, so a crash mid-write leaves
//! the previous contents intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Errors raised by [`LocalStorage`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of string slots.
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Handle to client-local storage. Cheap to clone; clones share slots.
#[derive(Clone)]
pub struct LocalStorage {
    inner: Arc<LocalStorageInner>,
}

struct LocalStorageInner {
    /// `None` for the in-memory backend.
    path: Option<PathBuf>,
    slots: Mutex<BTreeMap<String, String>>,
}

impl LocalStorage {
    /// Open (or lazily create) file-backed storage at `path`.
    ///
    /// A missing file is treated as empty storage; the file and its parent
    /// directories are created on the first write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file exists but cannot be read, or
    /// `StorageError::Corrupt` if it does not hold a JSON object of strings.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let slots = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Storage file absent, starting empty");
                BTreeMap::new()
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            inner: Arc::new(LocalStorageInner {
                path: Some(path),
                slots: Mutex::new(slots),
            }),
        })
    }

    /// Storage that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(LocalStorageInner {
                path: None,
                slots: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Read a slot.
    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.inner.slots.lock().await.get(key).cloned()
    }

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing file cannot be written. The
    /// in-memory slot is only updated once the write has succeeded.
    pub async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut slots = self.inner.slots.lock().await;
        let previous = slots.insert(key.to_string(), value);
        if let Err(e) = self.persist(&slots).await {
            match previous {
                Some(old) => slots.insert(key.to_string(), old),
                None => slots.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Delete a slot. Deleting an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing file cannot be written.
    pub async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.inner.slots.lock().await;
        if let Some(previous) = slots.remove(key)
            && let Err(e) = self.persist(&slots).await
        {
            slots.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    /// Write every slot to disk. Caller holds the slot lock.
    async fn persist(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };

        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let bytes = serde_json::to_vec_pretty(slots).map_err(|source| StorageError::Corrupt {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

        debug!(slots = slots.len(), "Storage written");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_set_get_remove() {
        let storage = LocalStorage::in_memory();
        assert_eq!(storage.get_item("k").await, None);

        storage.set_item("k", "v1".to_string()).await.unwrap();
        storage.set_item("k", "v2".to_string()).await.unwrap();
        assert_eq!(storage.get_item("k").await.as_deref(), Some("v2"));

        storage.remove_item("k").await.unwrap();
        assert_eq!(storage.get_item("k").await, None);
        storage.remove_item("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let storage = LocalStorage::open(&path).await.unwrap();
        storage.set_item("cartItems", "[]".to_string()).await.unwrap();
        storage.set_item("theme", "dark".to_string()).await.unwrap();

        let reopened = LocalStorage::open(&path).await.unwrap();
        assert_eq!(reopened.get_item("cartItems").await.as_deref(), Some("[]"));
        assert_eq!(reopened.get_item("theme").await.as_deref(), Some("dark"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_open_missing_and_blank_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = LocalStorage::open(dir.path().join("none.json")).await.unwrap();
        assert_eq!(missing.get_item("cartItems").await, None);

        let blank_path = dir.path().join("blank.json");
        std::fs::write(&blank_path, "  \n").unwrap();
        let blank = LocalStorage::open(&blank_path).await.unwrap();
        assert_eq!(blank.get_item("cartItems").await, None);
    }

    #[tokio::test]
    async fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = LocalStorage::open(&path).await;
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
