// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Schedule boards
//
// Joins fetched schedules with the favorites list and applies each
// favorite's route enablement.

use super::manage::sorted_by_rank;
use crate::cache::FavoritesSnapshot;
use crate::models::{FavoriteStation, StationSchedule, TrainTime};
use crate::polling::QueryState;
use crate::types::{AppError, Direction, EnablementDefault};

/// Arrivals shown for one station
#[derive(Debug, Clone, PartialEq)]
pub struct StationBoard {
    pub id: String,
    pub name: String,
    pub northbound: Vec<TrainTime>,
    pub southbound: Vec<TrainTime>,
}

impl StationBoard {
    /// Every arrival of a schedule, unfiltered
    pub fn unfiltered(station: &StationSchedule) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            northbound: station.northbound.clone(),
            southbound: station.southbound.clone(),
        }
    }

    /// Arrivals of a schedule that `favorite` has enabled
    pub fn filtered(
        station: &StationSchedule,
        favorite: &FavoriteStation,
        default: EnablementDefault,
    ) -> Self {
        let keep = |direction: Direction| -> Vec<TrainTime> {
            station
                .times(direction)
                .iter()
                .filter(|t| favorite.is_route_enabled(direction, &t.route, default))
                .cloned()
                .collect()
        };

        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            northbound: keep(Direction::Northbound),
            southbound: keep(Direction::Southbound),
        }
    }

    pub fn times(&self, direction: Direction) -> &[TrainTime] {
        match direction {
            Direction::Northbound => &self.northbound,
            Direction::Southbound => &self.southbound,
        }
    }

    /// Nothing to show; rendered as "No trains found"
    pub fn is_empty(&self) -> bool {
        self.northbound.is_empty() && self.southbound.is_empty()
    }
}

/// Boards for the active favorites, ordered by rank
///
/// Unranked favorites follow in list order. Favorites without a fetched
/// schedule are skipped.
pub fn build_board(
    favorites: &[FavoriteStation],
    stations: &[StationSchedule],
    default: EnablementDefault,
) -> Vec<StationBoard> {
    sorted_by_rank(favorites)
        .iter()
        .filter(|f| f.is_active())
        .filter_map(|favorite| {
            stations
                .iter()
                .find(|s| s.id == favorite.id)
                .map(|station| StationBoard::filtered(station, favorite, default))
        })
        .collect()
}

/// Arrivals of one route in one direction, for the route detail screen
pub fn route_arrivals(station: &StationSchedule, direction: Direction, route: &str) -> Vec<TrainTime> {
    station
        .times(direction)
        .iter()
        .filter(|t| t.route == route)
        .cloned()
        .collect()
}

/// What the home screen shows
#[derive(Debug, Clone, PartialEq)]
pub enum HomeView {
    Loading,
    /// "No stations have been favorited."
    NoFavorites,
    Board {
        stations: Vec<StationBoard>,
        is_refreshing: bool,
        error: Option<AppError>,
    },
}

impl HomeView {
    pub fn new(favorites: &FavoritesSnapshot, query: &QueryState, default: EnablementDefault) -> Self {
        if favorites.is_loading || query.is_loading() {
            return Self::Loading;
        }
        if favorites.favorites.is_empty() {
            return Self::NoFavorites;
        }

        let stations = query.data.as_deref().unwrap_or_default();
        Self::Board {
            stations: build_board(&favorites.favorites, stations, default),
            is_refreshing: query.is_refetching(),
            error: favorites.error.clone().or_else(|| query.error.clone()),
        }
    }
}
