// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Key-value storage
//
// Values are opaque strings stored under fixed keys. The file backend keeps
// one file per key in the config directory and never exposes a half-written
// value: each write goes to its own temp file in the same directory, which
// is then renamed into place.

use crate::types::AppError;
use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Async key-value backend used by the local stores
pub trait KeyValueStorage: Send + Sync + 'static {
    /// Read the value stored under `key`, `None` if never written
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// Replace the value stored under `key`
    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Remove the value stored under `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// File-per-key storage rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Storage in the platform config directory
    pub fn new() -> Result<Self, AppError> {
        Self::with_root(crate::settings::config_dir()?)
    }

    /// Storage rooted at `root`, created if missing
    pub fn with_root(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| AppError::FileIo(format!("Failed to create storage dir: {}", e)))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", file_name))
    }
}

impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::FileIo(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        let root = self.root.clone();
        let path = self.path_for(key);
        let content = value.to_string();

        tokio::task::spawn_blocking(move || write_replace(&root, &path, &content))
            .await
            .map_err(|e| AppError::FileIo(format!("Write task failed: {}", e)))??;

        tracing::debug!("Stored {} bytes under {}", value.len(), key);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::FileIo(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Write `content` to a fresh temp file in `root` and rename it over `path`
fn write_replace(root: &Path, path: &Path, content: &str) -> Result<(), AppError> {
    let mut file = tempfile::NamedTempFile::new_in(root)
        .map_err(|e| AppError::FileIo(format!("Failed to create temp file: {}", e)))?;
    file.write_all(content.as_bytes())
        .map_err(|e| AppError::FileIo(format!("Failed to write {}: {}", path.display(), e)))?;
    file.persist(path)
        .map_err(|e| AppError::FileIo(format!("Failed to replace {}: {}", path.display(), e)))?;
    Ok(())
}

/// Process-local storage for ephemeral sessions and tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::Storage("Memory storage lock poisoned".to_string())
    }
}

impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        let items = self.items.read().map_err(|_| Self::poisoned())?;
        Ok(items.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_key_to_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::with_root(dir.path()).unwrap();
        let path = storage.path_for("__mta:favorites");
        assert_eq!(path.file_name().unwrap(), "__mta_favorites.json");
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::with_root(dir.path()).unwrap();

        assert_eq!(storage.get_item("k").await.unwrap(), None);
        storage.set_item("k", "[1,2]").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("[1,2]"));
        // Only the value file remains; the temp file was renamed into place
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        storage.remove_item("k").await.unwrap();
        storage.remove_item("k").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_overlapping_writes_are_whole() {
        const SIZE: usize = 200_000;
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::with_root(dir.path()).unwrap());

        let mut writers = Vec::new();
        for i in 0..64u8 {
            let storage = storage.clone();
            writers.push(tokio::spawn(async move {
                let value = char::from(b'a' + i % 26).to_string().repeat(SIZE);
                storage.set_item("k", &value).await
            }));
        }

        let mut readers = Vec::new();
        for _ in 0..8 {
            let storage = storage.clone();
            readers.push(tokio::spawn(async move {
                let mut partial = 0;
                for _ in 0..50 {
                    if let Some(value) = storage.get_item("k").await.unwrap() {
                        let first = value.chars().next();
                        if value.len() != SIZE || value.chars().any(|c| Some(c) != first) {
                            partial += 1;
                        }
                    }
                    tokio::task::yield_now().await;
                }
                partial
            }));
        }

        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        for reader in readers {
            assert_eq!(reader.await.unwrap(), 0);
        }

        let value = storage.get_item("k").await.unwrap().unwrap();
        assert_eq!(value.len(), SIZE);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v"));
        storage.remove_item("k").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap(), None);
    }
}
