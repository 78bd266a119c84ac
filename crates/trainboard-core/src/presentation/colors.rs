// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Route bullet colors

/// Bullet colors for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteColor {
    pub background: &'static str,
    pub text: &'static str,
}

const WHITE: &str = "#FFFFFF";
const BLACK: &str = "#000000";

const fn color(background: &'static str, text: &'static str) -> RouteColor {
    RouteColor { background, text }
}

/// Line color of a subway route, by trunk line
pub fn route_color(route: &str) -> RouteColor {
    match route {
        "A" | "C" | "E" => color("#0039A6", WHITE),
        "B" | "D" | "F" | "M" => color("#FF6319", WHITE),
        "1" | "2" | "3" => color("#EE352E", WHITE),
        "4" | "5" | "6" | "6X" => color("#00933C", WHITE),
        "N" | "Q" | "R" | "W" => color("#FCCC0A", BLACK),
        "J" | "Z" => color("#996633", WHITE),
        "L" => color("#A7A9AC", WHITE),
        "G" => color("#6CBE45", WHITE),
        "7" | "7X" => color("#B933AD", WHITE),
        _ => color("#18181B", WHITE),
    }
}
