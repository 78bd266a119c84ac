// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Nearby stations

use super::board::StationBoard;
use crate::api::ScheduleQuery;
use crate::models::StationSchedule;
use crate::types::AppError;

/// Foreground location permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationPermission {
    Granted,
    Denied,
}

/// A position fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Best known position: a fresh fix wins over the last known one
pub fn best_location(current: Option<Coordinates>, last_known: Option<Coordinates>) -> Option<Coordinates> {
    current.or(last_known)
}

/// Query for the stations around the user
///
/// Fails with a readable message when location access is denied; `Ok(None)`
/// means no fix is available yet and nothing should be fetched.
pub fn nearby_query(
    permission: LocationPermission,
    location: Option<Coordinates>,
    limit: u32,
) -> Result<Option<ScheduleQuery>, AppError> {
    if permission == LocationPermission::Denied {
        return Err(AppError::location_denied());
    }
    Ok(location.map(|c| ScheduleQuery::Nearby {
        latitude: c.latitude,
        longitude: c.longitude,
        limit,
    }))
}

/// Nearby stations are shown with every arrival
pub fn nearby_board(stations: &[StationSchedule]) -> Vec<StationBoard> {
    stations.iter().map(StationBoard::unfiltered).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::schedule;

    const HERE: Coordinates = Coordinates {
        latitude: 40.690635,
        longitude: -73.981824,
    };

    #[test]
    fn test_denied_permission_blocks_fetch() {
        let err = nearby_query(LocationPermission::Denied, Some(HERE), 5).unwrap_err();
        assert_eq!(err.to_string(), "Permission to access location was denied");
    }

    #[test]
    fn test_query_waits_for_fix() {
        assert_eq!(nearby_query(LocationPermission::Granted, None, 5).unwrap(), None);
        let query = nearby_query(LocationPermission::Granted, Some(HERE), 5)
            .unwrap()
            .unwrap();
        assert!(matches!(query, ScheduleQuery::Nearby { limit: 5, .. }));
    }

    #[test]
    fn test_best_location_prefers_current() {
        let stale = Coordinates {
            latitude: 0.0,
            longitude: 0.0,
        };
        assert_eq!(best_location(Some(HERE), Some(stale)), Some(HERE));
        assert_eq!(best_location(None, Some(stale)), Some(stale));
    }

    #[test]
    fn test_nearby_board_is_unfiltered() {
        let board = nearby_board(&[schedule("n1", "Nearby")]);
        assert_eq!(board[0].northbound.len(), 1);
        assert_eq!(board[0].southbound.len(), 1);
    }
}
