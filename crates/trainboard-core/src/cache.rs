// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Favorites cache controller
//
// Holds the in-memory copy of the favorites list that views render from.
// Every mutation goes through the store and then re-reads it, so the
// memory copy always reflects what a fresh read would return.

use crate::favorites::FavoritesStore;
use crate::models::{FavoritePatch, FavoriteStation};
use crate::storage::KeyValueStorage;
use crate::types::AppError;
use tokio::sync::watch;

/// What views observe from the cache controller
#[derive(Debug, Clone, PartialEq)]
pub struct FavoritesSnapshot {
    pub favorites: Vec<FavoriteStation>,
    pub is_loading: bool,
    pub error: Option<AppError>,
}

impl Default for FavoritesSnapshot {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            is_loading: true,
            error: None,
        }
    }
}

/// In-memory reflection of the favorites store
///
/// Mutations are not serialized against each other; when two overlap, the
/// one that reaches the store last wins.
pub struct FavoritesCache<S> {
    store: FavoritesStore<S>,
    state: watch::Sender<FavoritesSnapshot>,
}

impl<S: KeyValueStorage> FavoritesCache<S> {
    /// Create an empty controller; call `initialize` to load it
    pub fn new(store: FavoritesStore<S>) -> Self {
        let (state, _) = watch::channel(FavoritesSnapshot::default());
        Self { store, state }
    }

    /// Initial load from the store
    pub async fn initialize(&self) {
        let favorites = self.store.read().await;
        tracing::info!("Loaded {} favorites", favorites.len());
        self.state.send_modify(|state| {
            state.favorites = favorites;
            state.is_loading = false;
        });
    }

    /// Re-read the store into memory
    pub async fn refresh(&self) {
        let favorites = self.store.read().await;
        self.replace(favorites);
    }

    /// Persist `favorites` as the whole list
    pub async fn set(&self, favorites: Vec<FavoriteStation>) -> Result<(), AppError> {
        if let Err(e) = self.store.write(&favorites).await {
            self.record_error(&e);
            return Err(e);
        }
        self.refresh().await;
        Ok(())
    }

    /// Shallow-merge `patch` into the favorite with `id`
    pub async fn update(&self, id: &str, patch: FavoritePatch) -> Result<(), AppError> {
        // Base the change on the store, not memory, so a stale copy is never written back
        let mut favorites = self.store.read().await;
        match favorites.iter_mut().find(|f| f.id == id) {
            Some(favorite) => patch.apply(favorite),
            None => tracing::debug!("Update for unknown favorite {}", id),
        }
        self.set(favorites).await
    }

    /// Reset to the built-in defaults
    pub async fn clear(&self) -> Result<(), AppError> {
        if let Err(e) = self.store.clear().await {
            self.record_error(&e);
            return Err(e);
        }
        self.refresh().await;
        Ok(())
    }

    pub fn favorites(&self) -> Vec<FavoriteStation> {
        self.state.borrow().favorites.clone()
    }

    pub fn get(&self, id: &str) -> Option<FavoriteStation> {
        self.state.borrow().favorites.iter().find(|f| f.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.borrow().favorites.iter().any(|f| f.id == id)
    }

    /// Ids of the favorites included in polling, in list order
    pub fn active_ids(&self) -> Vec<String> {
        self.state
            .borrow()
            .favorites
            .iter()
            .filter(|f| f.is_active())
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<AppError> {
        self.state.borrow().error.clone()
    }

    pub fn snapshot(&self) -> FavoritesSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every change of the in-memory list
    pub fn subscribe(&self) -> watch::Receiver<FavoritesSnapshot> {
        self.state.subscribe()
    }

    fn replace(&self, favorites: Vec<FavoriteStation>) {
        self.state.send_modify(|state| {
            state.favorites = favorites;
            state.is_loading = false;
            state.error = None;
        });
    }

    fn record_error(&self, error: &AppError) {
        tracing::error!("Favorites update failed: {}", error);
        self.state.send_modify(|state| state.error = Some(error.clone()));
    }
}
