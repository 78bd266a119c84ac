// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Arrival labels

use super::colors::{route_color, RouteColor};
use crate::models::TrainTime;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Countdown text for a predicted arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalLabel {
    ArrivingSoon,
    Seconds(i64),
    Minutes(i64),
}

impl ArrivalLabel {
    pub fn at(time: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let secs = (time - now).num_seconds();
        let mins = secs / 60;
        if secs < 15 {
            Self::ArrivingSoon
        } else if mins < 1 {
            Self::Seconds(secs)
        } else {
            Self::Minutes(mins)
        }
    }
}

impl fmt::Display for ArrivalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArrivingSoon => f.write_str("Arriving soon"),
            Self::Seconds(n) => write!(f, "{} {} away", n, if *n == 1 { "second" } else { "seconds" }),
            Self::Minutes(n) => write!(f, "{} {} away", n, if *n == 1 { "min" } else { "mins" }),
        }
    }
}

/// One rendered schedule line
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalRow {
    pub route: String,
    pub color: RouteColor,
    pub label: ArrivalLabel,
    /// Wall-clock arrival, e.g. "4:05 pm"
    pub clock: String,
    /// Predicted time is already in the past
    pub departed: bool,
}

impl ArrivalRow {
    pub fn new<Tz>(train: &TrainTime, now: DateTime<Utc>, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            route: train.route.clone(),
            color: route_color(&train.route),
            label: ArrivalLabel::at(train.time, now),
            clock: format_clock(train.time, tz),
            departed: train.time < now,
        }
    }
}

/// 12-hour clock time in `tz`, lowercase meridiem
pub fn format_clock<Tz>(time: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    time.with_timezone(tz).format("%-I:%M %P").to_string()
}
