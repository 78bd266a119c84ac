// SPDX-License-Identifier: AGPL-3.0
// Trainboard - Console commands

use trainboard_core::presentation::Coordinates;
use trainboard_core::{Direction, EnablementDefault};

/// One line of console input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    Search(String),
    Add(String),
    Remove(String),
    Move { from: usize, to: usize },
    Activate(String),
    Route {
        station: String,
        direction: Direction,
        route: String,
    },
    Toggle {
        station: String,
        direction: Direction,
        route: String,
    },
    /// Stations around a position, or the last one given
    Nearby(Option<Coordinates>),
    RoutesDefault(EnablementDefault),
    Online(bool),
    Foreground(bool),
    Reset,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  r                         refresh now
  search <text>             search stations
  add <id>                  favorite a station from the last search
  rm <id>                   remove a favorite
  mv <from> <to>            reorder favorites (1-based)
  active <id>               pause or resume a favorite on the board
  route <id> <N|S> <route>  upcoming trains of one route
  toggle <id> <N|S> <route> show or hide a route on the board
  nearby [<lat> <lon>]      stations around a position (default: last one)
  default show|hide         show or hide routes without a saved setting
  online | offline          simulate connectivity
  fg | bg                   simulate app foreground/background
  reset                     restore the default favorites
  q                         quit";

impl Command {
    /// Parse a console line; `Err` carries the message to show
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (name, rest.as_slice()) {
            ("r" | "refresh", []) => Self::Refresh,
            ("search" | "s", words) if !words.is_empty() => Self::Search(words.join(" ")),
            ("add", [id]) => Self::Add(id.to_string()),
            ("rm", [id]) => Self::Remove(id.to_string()),
            ("mv", [from, to]) => Self::Move {
                from: position(from)?,
                to: position(to)?,
            },
            ("active", [id]) => Self::Activate(id.to_string()),
            ("route", [station, direction, route]) => Self::Route {
                station: station.to_string(),
                direction: direction_code(direction)?,
                route: route.to_string(),
            },
            ("toggle", [station, direction, route]) => Self::Toggle {
                station: station.to_string(),
                direction: direction_code(direction)?,
                route: route.to_string(),
            },
            ("nearby", []) => Self::Nearby(None),
            ("nearby", [latitude, longitude]) => Self::Nearby(Some(Coordinates {
                latitude: coordinate(latitude)?,
                longitude: coordinate(longitude)?,
            })),
            ("default", ["show"]) => Self::RoutesDefault(EnablementDefault::Show),
            ("default", ["hide"]) => Self::RoutesDefault(EnablementDefault::Hide),
            ("online", []) => Self::Online(true),
            ("offline", []) => Self::Online(false),
            ("fg", []) => Self::Foreground(true),
            ("bg", []) => Self::Foreground(false),
            ("reset", []) => Self::Reset,
            ("help" | "?", []) => Self::Help,
            ("q" | "quit", []) => Self::Quit,
            _ => return Err(format!("Unknown command: {}", line.trim())),
        };
        Ok(Some(command))
    }
}

fn position(word: &str) -> Result<usize, String> {
    match word.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("Not a list position: {}", word)),
    }
}

fn direction_code(word: &str) -> Result<Direction, String> {
    Direction::from_code(word).ok_or_else(|| format!("Direction must be N or S, got {}", word))
}

fn coordinate(word: &str) -> Result<f64, String> {
    word.parse()
        .map_err(|_| format!("Not a coordinate: {}", word))
}
