// SPDX-License-Identifier: AGPL-3.0
// Trainboard Core - Settings persistence
//
// Settings are stored in a local JSON file next to the favorites.
// The API host can be overridden from the environment.

use crate::types::{AppError, AppSettings, API_HOST_ENV};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Platform config directory for Trainboard, created if missing
pub fn config_dir() -> Result<PathBuf, AppError> {
    let config_dir = directories::ProjectDirs::from("com", "trainboard", "trainboard")
        .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
        .config_dir()
        .to_path_buf();

    fs::create_dir_all(&config_dir)
        .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;

    Ok(config_dir)
}

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Create a settings store in the platform config directory
    pub fn new() -> Result<Self, AppError> {
        Self::with_path(config_dir()?.join("settings.json"))
    }

    /// Create a settings store backed by `file_path`, loading it if present
    pub fn with_path(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let exists = file_path.exists();
        let settings = if exists {
            Self::load(&file_path)?
        } else {
            tracing::info!("No settings file found, using defaults");
            AppSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        if !exists {
            tracing::info!("Creating initial settings file");
            store.persist()?;
        }

        Ok(store)
    }

    fn load(path: &Path) -> Result<AppSettings, AppError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::FileIo(format!("Failed to read settings: {}", e)))?;

        let settings: AppSettings = serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse settings, using defaults: {}", e);
            AppSettings::default()
        });

        if let Err(e) = settings.validate() {
            tracing::warn!("Ignoring invalid settings file: {}", e);
            return Ok(AppSettings::default());
        }
        Ok(settings)
    }

    fn persist(&self) -> Result<(), AppError> {
        let content = {
            let settings = self.read_lock()?;
            serde_json::to_string_pretty(&*settings).map_err(|e| {
                AppError::Serialization(format!("Failed to serialize settings: {}", e))
            })?
        };

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, AppSettings>, AppError> {
        self.settings
            .read()
            .map_err(|_| AppError::Storage("Settings lock poisoned".to_string()))
    }

    /// Stored settings, without environment overrides
    pub fn get(&self) -> AppSettings {
        self.read_lock()
            .map(|settings| settings.clone())
            .unwrap_or_default()
    }

    /// Settings with `TRAINBOARD_API_HOST` applied
    pub fn effective(&self) -> AppSettings {
        apply_env_overrides(self.get(), std::env::var(API_HOST_ENV).ok())
    }

    /// Update settings and persist to disk
    pub fn update(&self, new_settings: AppSettings) -> Result<(), AppError> {
        new_settings.validate()?;
        tracing::info!(
            "Updating settings, poll interval: {}s",
            new_settings.poll_interval_secs
        );
        {
            let mut settings = self
                .settings
                .write()
                .map_err(|_| AppError::Storage("Settings lock poisoned".to_string()))?;
            *settings = new_settings;
        }

        let result = self.persist();
        if let Err(e) = &result {
            tracing::error!("Failed to persist settings: {}", e);
        }
        result
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn apply_env_overrides(mut settings: AppSettings, api_host: Option<String>) -> AppSettings {
    if let Some(host) = api_host.filter(|h| !h.trim().is_empty()) {
        tracing::info!("Using API host from {}: {}", API_HOST_ENV, host);
        settings.api_base_url = host;
    }
    settings
}
