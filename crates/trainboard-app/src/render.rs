// SPDX-License-Identifier: AGPL-3.0
// Trainboard - Text rendering of the view models

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Write};
use trainboard_core::presentation::{ArrivalRow, HomeView, StationBoard};
use trainboard_core::{Direction, StationSchedule, TrainTime};

/// Home screen as text
pub fn home<Tz>(view: &HomeView, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match view {
        HomeView::Loading => "Loading...\n".to_string(),
        HomeView::NoFavorites => "No stations have been favorited.\n".to_string(),
        HomeView::Board {
            stations,
            is_refreshing,
            error,
        } => {
            let mut out = String::new();
            if let Some(error) = error {
                let _ = writeln!(out, "! {}", error);
            }
            if *is_refreshing {
                out.push_str("(refreshing)\n");
            }
            for station in stations {
                out.push_str(&board(station, now, tz));
            }
            out
        }
    }
}

/// One station card
pub fn board<Tz>(station: &StationBoard, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = format!("== {} [{}]\n", station.name, station.id);
    if station.is_empty() {
        out.push_str("   No trains found\n");
        return out;
    }
    for direction in Direction::ALL {
        let times = station.times(direction);
        if times.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {}", direction);
        out.push_str(&rows(times, now, tz));
    }
    out
}

/// Arrival lines, one per train
pub fn rows<Tz>(times: &[TrainTime], now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    for train in times {
        let row = ArrivalRow::new(train, now, tz);
        let marker = if row.departed { " (departed)" } else { "" };
        let _ = writeln!(
            out,
            "   ({:>2}) {:<16} {}{}",
            row.route,
            row.label.to_string(),
            row.clock,
            marker
        );
    }
    out
}

/// Search results list
pub fn search_results(query: &str, results: &[StationSchedule]) -> String {
    if results.is_empty() {
        return format!("No stations match \"{}\"\n", query);
    }
    let mut out = format!("Results for \"{}\":\n", query);
    for station in results {
        let _ = writeln!(out, "  {:<6} {} ({})", station.id, station.name, station.routes.join(" "));
    }
    out
}
