// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Favorites management
//
// List edits behind the favorites, ranking and route settings screens.
// The pure helpers build the new list; the cache methods persist it with a
// single write.

use crate::cache::FavoritesCache;
use crate::models::{EnabledRoutes, FavoritePatch, FavoriteStation, StationSchedule};
use crate::storage::KeyValueStorage;
use crate::types::{AppError, Direction, EnablementDefault};

/// `favorites` plus a new favorite for `station`, or `None` if already present
pub fn with_favorite(favorites: &[FavoriteStation], station: &StationSchedule) -> Option<Vec<FavoriteStation>> {
    if favorites.iter().any(|f| f.id == station.id) {
        return None;
    }
    let mut updated = favorites.to_vec();
    updated.push(FavoriteStation::from_schedule(station));
    Some(updated)
}

/// `favorites` without the favorite `id`
pub fn without_favorite(favorites: &[FavoriteStation], id: &str) -> Vec<FavoriteStation> {
    favorites.iter().filter(|f| f.id != id).cloned().collect()
}

/// Move the favorite at `from` to `to` and renumber ranks 1..N
pub fn reorder(favorites: &[FavoriteStation], from: usize, to: usize) -> Vec<FavoriteStation> {
    let mut updated = favorites.to_vec();
    if from < updated.len() {
        let moved = updated.remove(from);
        let to = to.min(updated.len());
        updated.insert(to, moved);
    }
    rerank(updated)
}

/// Assign ranks 1..N in list order
fn rerank(mut favorites: Vec<FavoriteStation>) -> Vec<FavoriteStation> {
    for (index, favorite) in favorites.iter_mut().enumerate() {
        favorite.rank = Some(index as u32 + 1);
    }
    favorites
}

/// Stable sort by rank; unranked favorites keep their place after the ranked ones
pub fn sorted_by_rank(favorites: &[FavoriteStation]) -> Vec<FavoriteStation> {
    let mut sorted = favorites.to_vec();
    sorted.sort_by_key(|f| f.rank.unwrap_or(u32::MAX));
    sorted
}

impl<S: KeyValueStorage> FavoritesCache<S> {
    /// Add a search result as a favorite; `false` if it was already a favorite
    pub async fn add_station(&self, station: &StationSchedule) -> Result<bool, AppError> {
        match with_favorite(&self.favorites(), station) {
            Some(updated) => {
                tracing::info!("Adding favorite {} ({})", station.name, station.id);
                self.set(updated).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Swipe-delete a favorite
    pub async fn remove_station(&self, id: &str) -> Result<(), AppError> {
        tracing::info!("Removing favorite {}", id);
        self.set(without_favorite(&self.favorites(), id)).await
    }

    /// Add the station if missing, remove it otherwise
    pub async fn toggle_station(&self, station: &StationSchedule) -> Result<(), AppError> {
        if self.contains(&station.id) {
            self.remove_station(&station.id).await
        } else {
            self.add_station(station).await.map(|_| ())
        }
    }

    /// Persist the result of one drag-and-drop gesture over the ranked list
    pub async fn move_station(&self, from: usize, to: usize) -> Result<(), AppError> {
        self.set(reorder(&sorted_by_rank(&self.favorites()), from, to)).await
    }
}

/// Local state of the route settings screen for one favorite
///
/// Toggles show immediately; if saving fails the previous state is restored.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEnablementEditor {
    station_id: String,
    routes: Vec<String>,
    enabled: EnabledRoutes,
}

impl RouteEnablementEditor {
    /// Seed from the favorite and the routes the station currently serves
    pub fn new(favorite: &FavoriteStation, station_routes: &[String], default: EnablementDefault) -> Self {
        let mut routes = station_routes.to_vec();
        routes.sort();
        routes.dedup();
        Self {
            station_id: favorite.id.clone(),
            enabled: favorite.effective_enabled(&routes, default),
            routes,
        }
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Routes with their switch state, sorted by route id
    pub fn rows(&self, direction: Direction) -> Vec<(String, bool)> {
        self.routes
            .iter()
            .map(|route| (route.clone(), self.is_enabled(direction, route)))
            .collect()
    }

    pub fn is_enabled(&self, direction: Direction, route: &str) -> bool {
        self.enabled.get(direction, route).unwrap_or(false)
    }

    pub fn enabled(&self) -> &EnabledRoutes {
        &self.enabled
    }

    /// Flip one switch and save it; returns the new switch state
    pub async fn toggle<S: KeyValueStorage>(
        &mut self,
        cache: &FavoritesCache<S>,
        direction: Direction,
        route: &str,
    ) -> Result<bool, AppError> {
        let previous = self.enabled.clone();
        let value = !self.is_enabled(direction, route);
        self.enabled.set(direction, route, value);

        match cache
            .update(&self.station_id, FavoritePatch::enabled(self.enabled.clone()))
            .await
        {
            Ok(()) => Ok(value),
            Err(e) => {
                tracing::warn!(
                    "Reverting {} {} on {}: {}",
                    route,
                    direction,
                    self.station_id,
                    e
                );
                self.enabled = previous;
                Err(e)
            }
        }
    }
}
