// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `<config_dir>/camara/config.json`. A missing or
//! unreadable file, or one written by another config version, yields the
//! defaults.

use crate::backends::camera::{CameraBackendType, FacingMode};
use crate::constants::{app_info, storage};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Current configuration layout version
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout version of the stored file
    pub version: u32,
    /// Facing requested when the camera is opened
    pub default_facing: FacingMode,
    /// Camera backend to use (PipeWire or a still image)
    pub backend: CameraBackendType,
    /// Source file for the still image backend
    pub still_image_path: Option<PathBuf>,
    /// Root directory of the named caches; `None` uses the user cache dir
    pub storage_root: Option<PathBuf>,
    /// Cache holding captured photos
    pub dynamic_cache: String,
    /// Cache holding the app shell resources
    pub shell_cache: String,
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            default_facing: FacingMode::default(),
            backend: CameraBackendType::default(),
            still_image_path: None,
            storage_root: None,
            dynamic_cache: storage::DYNAMIC_CACHE_NAME.to_string(),
            shell_cache: storage::SHELL_CACHE_NAME.to_string(),
            mirror_preview: true,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_info::APP_DIR).join(app_info::CONFIG_FILE))
    }

    /// Load from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No user config directory, using default configuration");
                Self::default()
            }
        }
    }

    /// Load from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&text) {
            Ok(config) if config.version == CONFIG_VERSION => config,
            Ok(config) => {
                warn!(
                    found = config.version,
                    expected = CONFIG_VERSION,
                    "Config version mismatch, using defaults"
                );
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Resolved storage root
    pub fn storage_root(&self) -> PathBuf {
        self.storage_root.clone().unwrap_or_else(default_storage_root)
    }
}

/// `<cache_dir>/camara`, or `./camara` without a cache dir
pub fn default_storage_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_info::APP_DIR)
}
