// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Shared logic for all frontends
//
// This crate provides:
// - AppSettings and AppError types
// - SettingsStore for persistent settings
// - FavoritesStore and FavoritesCache for the saved stations
// - HttpScheduleClient and the Poller for live arrivals
// - View models for the home, nearby and favorites screens
//
// Frontend-specific code lives in separate crates.

pub mod api;
pub mod cache;
pub mod favorites;
pub mod focus;
pub mod models;
pub mod online;
pub mod polling;
pub mod presentation;
pub mod query_cache;
pub mod search;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub use api::{HttpScheduleClient, ScheduleQuery, ScheduleSource};
pub use cache::{FavoritesCache, FavoritesSnapshot};
pub use favorites::{FavoritesStore, FAVORITES_KEY};
pub use focus::{AppStatus, FocusManager};
pub use models::{
    default_favorites, EnabledRoutes, FavoritePatch, FavoriteStation, StationSchedule, TrainTime,
};
pub use online::OnlineManager;
pub use polling::{PollHandle, Poller, QueryState, QueryStatus, RefreshEvent};
pub use query_cache::QueryCache;
pub use search::{SearchState, StationSearch};
pub use settings::SettingsStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use types::{AppError, AppSettings, Direction, EnablementDefault};
