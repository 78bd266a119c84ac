// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default schedule API host
pub const DEFAULT_API_BASE_URL: &str = "https://mta-api.fly.dev/api";

/// Environment variable that overrides the configured API host
pub const API_HOST_ENV: &str = "TRAINBOARD_API_HOST";

/// Service orientation at a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Northbound,
    Southbound,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Northbound, Direction::Southbound];

    /// Single-letter code used by the schedule API ("N" / "S")
    pub fn code(&self) -> &'static str {
        match self {
            Self::Northbound => "N",
            Self::Southbound => "S",
        }
    }

    /// Parse the single-letter API code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" | "n" => Some(Self::Northbound),
            "S" | "s" => Some(Self::Southbound),
            _ => None,
        }
    }

    /// Get display label for this direction
    pub fn label(&self) -> &'static str {
        match self {
            Self::Northbound => "Northbound",
            Self::Southbound => "Southbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a route with no explicit enablement entry is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnablementDefault {
    /// Unlisted routes are shown
    Show,
    /// Unlisted routes are suppressed
    #[default]
    Hide,
}

impl EnablementDefault {
    pub fn as_bool(&self) -> bool {
        matches!(self, Self::Show)
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Base URL of the schedule API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Seconds between schedule polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Quiet period before a typed search is sent
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Number of stations requested for the nearby list
    #[serde(default = "default_nearby_limit")]
    pub nearby_limit: u32,
    /// Treatment of routes missing from a favorite's enablement map
    #[serde(default)]
    pub enablement_default: EnablementDefault,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_search_debounce_ms() -> u64 {
    800
}

fn default_nearby_limit() -> u32 {
    5
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            search_debounce_ms: default_search_debounce_ms(),
            nearby_limit: default_nearby_limit(),
            enablement_default: EnablementDefault::default(),
        }
    }
}

impl AppSettings {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn search_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.search_debounce_ms)
    }

    /// Check values that would make the app unusable
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::InvalidConfig("API base URL is empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::InvalidConfig(
                "Poll interval must be at least one second".to_string(),
            ));
        }
        if self.nearby_limit == 0 {
            return Err(AppError::InvalidConfig(
                "Nearby limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error types for the application
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    PermissionDenied(String),
}

impl AppError {
    pub fn location_denied() -> Self {
        AppError::PermissionDenied("Permission to access location was denied".to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Serialization(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.poll_interval_secs, 10);
        assert_eq!(settings.search_debounce_ms, 800);
        assert_eq!(settings.nearby_limit, 5);
        assert_eq!(settings.enablement_default, EnablementDefault::Hide);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"pollIntervalSecs": 30, "enablementDefault": "show"}"#)
                .unwrap();
        assert_eq!(settings.poll_interval_secs, 30);
        assert_eq!(settings.enablement_default, EnablementDefault::Show);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_invalid_settings() {
        let settings = AppSettings {
            poll_interval_secs: 0,
            ..AppSettings::default()
        };
        assert!(matches!(settings.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(Direction::from_code("N"), Some(Direction::Northbound));
        assert_eq!(Direction::Southbound.code(), "S");
        assert_eq!(Direction::from_code("X"), None);
        assert_eq!(Direction::Northbound.to_string(), "Northbound");
    }
}
