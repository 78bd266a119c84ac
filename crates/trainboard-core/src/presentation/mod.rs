// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - View models
//
// Framework-free state for the home, nearby, route detail and favorites
// screens. Frontends render these directly.

pub mod arrival;
pub mod board;
pub mod colors;
pub mod manage;
pub mod nearby;

pub use arrival::{format_clock, ArrivalLabel, ArrivalRow};
pub use board::{build_board, route_arrivals, HomeView, StationBoard};
pub use colors::{route_color, RouteColor};
pub use manage::{reorder, sorted_by_rank, with_favorite, without_favorite, RouteEnablementEditor};
pub use nearby::{best_location, nearby_board, nearby_query, Coordinates, LocationPermission};
