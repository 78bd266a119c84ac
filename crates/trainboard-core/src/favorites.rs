// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Local favorites storage
//
// Favorites are stored as a JSON array under a single storage key.
// Reads never fail: corrupt records are dropped, an unreadable value
// yields an empty list and a missing value yields the built-in defaults.

use crate::models::{default_favorites, FavoriteStation};
use crate::storage::KeyValueStorage;
use crate::types::AppError;
use std::sync::Arc;

/// Storage key of the favorites list
pub const FAVORITES_KEY: &str = "__mta:favorites";

/// Durable favorites list on top of a key-value backend
pub struct FavoritesStore<S> {
    storage: Arc<S>,
}

impl<S> Clone for FavoritesStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: KeyValueStorage> FavoritesStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Load the persisted list
    pub async fn read(&self) -> Vec<FavoriteStation> {
        let content = match self.storage.get_item(FAVORITES_KEY).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::debug!("No favorites persisted, using defaults");
                return default_favorites();
            }
            Err(e) => {
                tracing::warn!("Failed to read favorites: {}", e);
                return Vec::new();
            }
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to parse favorites: {}", e);
                return Vec::new();
            }
        };

        let total = records.len();
        let favorites: Vec<FavoriteStation> = records.into_iter().filter_map(decode_record).collect();

        if favorites.len() < total {
            tracing::warn!("Dropped {} invalid favorite records", total - favorites.len());
        }

        if favorites.is_empty() {
            default_favorites()
        } else {
            favorites
        }
    }

    /// Replace the persisted list
    pub async fn write(&self, favorites: &[FavoriteStation]) -> Result<(), AppError> {
        let content = serde_json::to_string(favorites)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize favorites: {}", e)))?;

        let result = self.storage.set_item(FAVORITES_KEY, &content).await;
        match &result {
            Ok(()) => tracing::debug!("Saved {} favorites", favorites.len()),
            Err(e) => tracing::warn!("Failed to save favorites: {}", e),
        }
        result
    }

    /// Drop the persisted list so the next read yields the defaults
    pub async fn clear(&self) -> Result<(), AppError> {
        let result = self.storage.remove_item(FAVORITES_KEY).await;
        if let Err(e) = &result {
            tracing::warn!("Failed to clear favorites: {}", e);
        }
        result
    }
}

/// Decode one persisted record, `None` if it lacks an id or name
fn decode_record(record: serde_json::Value) -> Option<FavoriteStation> {
    let has_text = |field: &str| {
        record
            .get(field)
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty())
    };
    if !has_text("id") || !has_text("name") {
        return None;
    }
    serde_json::from_value(record).ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Memory storage that counts writes and can be made to fail
    #[derive(Default)]
    pub(crate) struct FlakyStorage {
        pub inner: MemoryStorage,
        pub fail_reads: AtomicBool,
        pub fail_writes: AtomicBool,
        pub writes: AtomicUsize,
    }

    impl KeyValueStorage for FlakyStorage {
        async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(AppError::Storage("storage unavailable".to_string()));
            }
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Storage("disk full".to_string()));
            }
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), AppError> {
            self.inner.remove_item(key).await
        }
    }

    fn station(id: &str, name: &str) -> FavoriteStation {
        FavoriteStation {
            active: Some(true),
            ..FavoriteStation::new(id, name)
        }
    }

    #[tokio::test]
    async fn test_missing_value_yields_defaults() {
        let store = FavoritesStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(store.read().await, default_favorites());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = FavoritesStore::new(Arc::new(MemoryStorage::new()));
        let list = vec![station("a", "Alpha"), station("b", "Beta")];
        store.write(&list).await.unwrap();
        assert_eq!(store.read().await, list);
    }

    #[tokio::test]
    async fn test_invalid_records_are_dropped() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(
                FAVORITES_KEY,
                r#"[{"id":"a","name":"Alpha"},{"id":"b"},{"name":"Nameless"},{"id":"","name":"x"},{"id":"c","name":"Gamma","rank":"first"}]"#,
            )
            .await
            .unwrap();

        let store = FavoritesStore::new(storage);
        let ids: Vec<_> = store.read().await.into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[tokio::test]
    async fn test_all_invalid_yields_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(FAVORITES_KEY, r#"[{"id":"b"}]"#)
            .await
            .unwrap();
        let store = FavoritesStore::new(storage);
        assert_eq!(store.read().await, default_favorites());
    }

    #[tokio::test]
    async fn test_malformed_json_yields_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(FAVORITES_KEY, "{not json").await.unwrap();
        let store = FavoritesStore::new(storage);
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_storage_yields_empty() {
        let storage = Arc::new(FlakyStorage::default());
        storage.fail_reads.store(true, Ordering::SeqCst);
        let store = FavoritesStore::new(storage);
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_restores_defaults() {
        let store = FavoritesStore::new(Arc::new(MemoryStorage::new()));
        store.write(&[station("a", "Alpha")]).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.read().await, default_favorites());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_value() {
        let storage = Arc::new(FlakyStorage::default());
        let store = FavoritesStore::new(storage.clone());
        let list = vec![station("a", "Alpha")];
        store.write(&list).await.unwrap();

        storage.fail_writes.store(true, Ordering::SeqCst);
        let result = store.write(&[station("b", "Beta")]).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(store.read().await, list);
    }
}
