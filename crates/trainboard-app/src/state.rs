// SPDX-License-Identifier: AGPL-3.0
// Trainboard - Application State

use std::sync::Arc;
use trainboard_core::{
    AppError, AppSettings, FavoritesCache, FavoritesStore, FileStorage, FocusManager,
    HttpScheduleClient, OnlineManager, Poller, QueryCache, SettingsStore,
};

/// Everything the home board needs, created once at startup
pub struct AppState {
    pub settings_store: SettingsStore,
    /// Stored settings with environment overrides applied
    pub settings: AppSettings,
    pub favorites: Arc<FavoritesCache<FileStorage>>,
    pub client: Arc<HttpScheduleClient>,
    pub query_cache: QueryCache,
    pub online: OnlineManager,
    pub focus: FocusManager,
    pub poller: Poller<HttpScheduleClient>,
}

impl AppState {
    /// Create application state with all stores initialized
    pub fn new() -> Result<Self, AppError> {
        let settings_store = SettingsStore::new()?;
        let settings = settings_store.effective();
        tracing::info!("Using schedule API at {}", settings.api_base_url);

        let storage = Arc::new(FileStorage::new()?);
        let favorites = Arc::new(FavoritesCache::new(FavoritesStore::new(storage)));
        let client = Arc::new(HttpScheduleClient::new(&settings.api_base_url)?);
        let query_cache = QueryCache::new();
        let online = OnlineManager::default();
        let focus = FocusManager::default();
        let poller = Poller::new(
            client.clone(),
            query_cache.clone(),
            online.clone(),
            focus.clone(),
            settings.poll_interval(),
        );

        Ok(Self {
            settings_store,
            settings,
            favorites,
            client,
            query_cache,
            online,
            focus,
            poller,
        })
    }
}
