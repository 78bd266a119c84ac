// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Station and favorite records
//
// FavoriteStation is the only record the client persists. StationSchedule
// and TrainTime mirror what the schedule API returns.

use crate::types::{Direction, EnablementDefault};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A predicted arrival of one train at a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTime {
    pub route: String,
    pub time: DateTime<Utc>,
}

/// Live schedule for a station as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSchedule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<[f64; 2]>,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(rename = "N", default)]
    pub northbound: Vec<TrainTime>,
    #[serde(rename = "S", default)]
    pub southbound: Vec<TrainTime>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl StationSchedule {
    /// Arrivals in one direction
    pub fn times(&self, direction: Direction) -> &[TrainTime] {
        match direction {
            Direction::Northbound => &self.northbound,
            Direction::Southbound => &self.southbound,
        }
    }
}

/// Per-direction route filter. Both maps always exist, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledRoutes {
    #[serde(default)]
    pub northbound: BTreeMap<String, bool>,
    #[serde(default)]
    pub southbound: BTreeMap<String, bool>,
}

impl EnabledRoutes {
    /// Every listed route enabled in both directions
    pub fn all_enabled<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut enabled = Self::default();
        for route in routes {
            let route = route.into();
            enabled.northbound.insert(route.clone(), true);
            enabled.southbound.insert(route, true);
        }
        enabled
    }

    pub fn direction(&self, direction: Direction) -> &BTreeMap<String, bool> {
        match direction {
            Direction::Northbound => &self.northbound,
            Direction::Southbound => &self.southbound,
        }
    }

    pub fn direction_mut(&mut self, direction: Direction) -> &mut BTreeMap<String, bool> {
        match direction {
            Direction::Northbound => &mut self.northbound,
            Direction::Southbound => &mut self.southbound,
        }
    }

    /// Explicit entry for a route, if any
    pub fn get(&self, direction: Direction, route: &str) -> Option<bool> {
        self.direction(direction).get(route).copied()
    }

    pub fn set(&mut self, direction: Direction, route: &str, enabled: bool) {
        self.direction_mut(direction)
            .insert(route.to_string(), enabled);
    }
}

/// A station the user has pinned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteStation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<EnabledRoutes>,
    /// Whole-direction switch from records written before `enabled` existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub northbound: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub southbound: Option<bool>,
}

impl FavoriteStation {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
            routes: None,
            rank: None,
            active: None,
            enabled: None,
            northbound: None,
            southbound: None,
        }
    }

    /// Favorite created from a search result: active, every route enabled
    pub fn from_schedule(station: &StationSchedule) -> Self {
        Self {
            location: station.location,
            routes: Some(station.routes.clone()),
            active: Some(true),
            enabled: Some(EnabledRoutes::all_enabled(station.routes.iter().cloned())),
            ..Self::new(station.id.clone(), station.name.clone())
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    fn legacy_direction(&self, direction: Direction) -> Option<bool> {
        match direction {
            Direction::Northbound => self.northbound,
            Direction::Southbound => self.southbound,
        }
    }

    /// Whether arrivals of `route` in `direction` are shown for this favorite
    pub fn is_route_enabled(
        &self,
        direction: Direction,
        route: &str,
        default: EnablementDefault,
    ) -> bool {
        match &self.enabled {
            Some(enabled) => enabled
                .get(direction, route)
                .unwrap_or_else(|| default.as_bool()),
            None => self
                .legacy_direction(direction)
                .unwrap_or_else(|| default.as_bool()),
        }
    }

    /// Enablement map to edit, seeded from the stored map or the known routes
    pub fn effective_enabled(&self, routes: &[String], default: EnablementDefault) -> EnabledRoutes {
        let mut enabled = self.enabled.clone().unwrap_or_default();
        for direction in Direction::ALL {
            for route in routes {
                if enabled.get(direction, route).is_none() {
                    let value = self.is_route_enabled(direction, route, default);
                    enabled.set(direction, route, value);
                }
            }
        }
        enabled
    }
}

/// Shallow patch applied by the cache controller's `update`
///
/// Present fields replace the record's field whole; nested values such as
/// `enabled` are not merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritePatch {
    pub name: Option<String>,
    pub location: Option<[f64; 2]>,
    pub routes: Option<Vec<String>>,
    pub rank: Option<u32>,
    pub active: Option<bool>,
    pub enabled: Option<EnabledRoutes>,
    pub northbound: Option<bool>,
    pub southbound: Option<bool>,
}

impl FavoritePatch {
    pub fn enabled(enabled: EnabledRoutes) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    pub fn apply(&self, favorite: &mut FavoriteStation) {
        if let Some(name) = &self.name {
            favorite.name = name.clone();
        }
        if let Some(location) = self.location {
            favorite.location = Some(location);
        }
        if let Some(routes) = &self.routes {
            favorite.routes = Some(routes.clone());
        }
        if let Some(rank) = self.rank {
            favorite.rank = Some(rank);
        }
        if let Some(active) = self.active {
            favorite.active = Some(active);
        }
        if let Some(enabled) = &self.enabled {
            favorite.enabled = Some(enabled.clone());
        }
        if let Some(northbound) = self.northbound {
            favorite.northbound = Some(northbound);
        }
        if let Some(southbound) = self.southbound {
            favorite.southbound = Some(southbound);
        }
    }
}

/// Favorites shown before the user has saved any of their own
pub fn default_favorites() -> Vec<FavoriteStation> {
    let station = |id: &str, name: &str, location: [f64; 2]| FavoriteStation {
        location: Some(location),
        active: Some(true),
        northbound: Some(true),
        southbound: Some(false),
        ..FavoriteStation::new(id, name)
    };

    vec![
        station("52ed", "DeKalb Av", [40.690635, -73.981824]),
        station("289d", "Nevins St", [40.688246, -73.980492]),
        station("ec1f", "Hoyt-Schermerhorn Sts", [40.688484, -73.985001]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_json() -> &'static str {
        r#"{
            "id": "52ed",
            "name": "DeKalb Av",
            "location": [40.690635, -73.981824],
            "routes": ["B", "Q", "R"],
            "last_update": "2024-05-01T12:00:00-04:00",
            "N": [{"route": "Q", "time": "2024-05-01T12:03:00-04:00"}],
            "S": [{"route": "R", "time": "2024-05-01T12:05:30-04:00"}]
        }"#
    }

    #[test]
    fn test_schedule_decoding() {
        let station: StationSchedule = serde_json::from_str(schedule_json()).unwrap();
        assert_eq!(station.routes, vec!["B", "Q", "R"]);
        assert_eq!(station.times(Direction::Northbound)[0].route, "Q");
        assert_eq!(
            station.times(Direction::Southbound)[0].time.to_rfc3339(),
            "2024-05-01T16:05:30+00:00"
        );
    }

    #[test]
    fn test_favorite_from_schedule_enables_all_routes() {
        let station: StationSchedule = serde_json::from_str(schedule_json()).unwrap();
        let favorite = FavoriteStation::from_schedule(&station);
        assert!(favorite.is_active());
        let enabled = favorite.enabled.unwrap();
        assert_eq!(enabled.northbound.len(), 3);
        assert_eq!(enabled.get(Direction::Southbound, "B"), Some(true));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_string(&FavoriteStation::new("a", "A")).unwrap();
        assert_eq!(json, r#"{"id":"a","name":"A"}"#);
    }

    #[test]
    fn test_enabled_map_always_has_both_directions() {
        let favorite: FavoriteStation =
            serde_json::from_str(r#"{"id":"a","name":"A","enabled":{"northbound":{"G":true}}}"#)
                .unwrap();
        let json = serde_json::to_value(&favorite).unwrap();
        assert!(json["enabled"]["southbound"].is_object());
    }

    #[test]
    fn test_route_enablement_rules() {
        let mut favorite = FavoriteStation::new("a", "A");
        favorite.enabled = Some(EnabledRoutes::all_enabled(["G"]));
        favorite.enabled.as_mut().unwrap().set(Direction::Southbound, "G", false);

        assert!(favorite.is_route_enabled(Direction::Northbound, "G", EnablementDefault::Hide));
        assert!(!favorite.is_route_enabled(Direction::Southbound, "G", EnablementDefault::Show));
        assert!(!favorite.is_route_enabled(Direction::Northbound, "F", EnablementDefault::Hide));
        assert!(favorite.is_route_enabled(Direction::Northbound, "F", EnablementDefault::Show));
    }

    #[test]
    fn test_legacy_direction_flags() {
        let favorite = &default_favorites()[0];
        assert!(favorite.is_route_enabled(Direction::Northbound, "Q", EnablementDefault::Hide));
        assert!(!favorite.is_route_enabled(Direction::Southbound, "Q", EnablementDefault::Show));

        let bare = FavoriteStation::new("a", "A");
        assert!(!bare.is_route_enabled(Direction::Northbound, "Q", EnablementDefault::Hide));
        assert!(bare.is_route_enabled(Direction::Northbound, "Q", EnablementDefault::Show));
    }

    #[test]
    fn test_effective_enabled_fills_known_routes() {
        let favorite = &default_favorites()[1];
        let routes = vec!["2".to_string(), "4".to_string()];
        let enabled = favorite.effective_enabled(&routes, EnablementDefault::Hide);
        assert_eq!(enabled.get(Direction::Northbound, "2"), Some(true));
        assert_eq!(enabled.get(Direction::Southbound, "4"), Some(false));
    }

    #[test]
    fn test_patch_replaces_enabled_whole() {
        let mut favorite = FavoriteStation::new("a", "A");
        favorite.enabled = Some(EnabledRoutes::all_enabled(["G", "F"]));
        favorite.rank = Some(2);

        let mut replacement = EnabledRoutes::default();
        replacement.set(Direction::Northbound, "G", false);
        FavoritePatch::enabled(replacement.clone()).apply(&mut favorite);

        assert_eq!(favorite.enabled, Some(replacement));
        assert_eq!(favorite.rank, Some(2));
        assert_eq!(favorite.name, "A");
    }

    #[test]
    fn test_default_favorites() {
        let defaults = default_favorites();
        let ids: Vec<_> = defaults.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["52ed", "289d", "ec1f"]);
        assert!(defaults.iter().all(|f| f.is_active()));
    }
}
