//! Application Configuration
//!
//! # Storage Locations
//! - Linux: `~/.config/dolby-eq/config.json`
//! - Windows: `%APPDATA%\dolby-eq\config.json`
//! - macOS: `~/Library/Application Support/dolby-eq/config.json`
//!
//! Preferences default to `preferences.json` in the platform data directory.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use dolby_eq::BandMode;
use dolby_effect::Profile;

use crate::error::CoreResult;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DolbyConfig {
    /// Preference file override; `None` uses the platform data directory
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// Profile selected before the user picks one
    #[serde(default)]
    pub default_profile: Profile,
    /// Band mode used before the user picks one
    #[serde(default)]
    pub default_band_mode: BandMode,
    /// Written to `createdBy` in exported preset files
    #[serde(default = "default_author")]
    pub export_author: String,
}

fn default_author() -> String {
    "dolby-eq".to_string()
}

impl Default for DolbyConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            default_profile: Profile::DYNAMIC,
            default_band_mode: BandMode::Ten,
            export_author: default_author(),
        }
    }
}

impl DolbyConfig {
    /// Load config from the platform path, or return default if missing/corrupt
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                info!("Using default config");
                Self::default()
            }
        }
    }

    /// Load config from `path`, or return default if missing/corrupt
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::File::open(path) {
                Ok(file) => match serde_json::from_reader(file) {
                    Ok(config) => {
                        info!("Config loaded from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        error!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    error!("Failed to open config file: {}", e);
                }
            }
        }

        info!("Using default config");
        Self::default()
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> CoreResult<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;

        info!("Config saved to {:?}", path);
        Ok(())
    }

    /// Where the preference store lives
    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .or_else(|| {
                ProjectDirs::from("org", "dolby-eq", "dolby-eq")
                    .map(|proj| proj.data_dir().join("preferences.json"))
            })
            .unwrap_or_else(|| PathBuf::from("preferences.json"))
    }

    /// Get the platform-specific configuration file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "dolby-eq", "dolby-eq")
            .map(|proj| proj.config_dir().join("config.json"))
    }
}
