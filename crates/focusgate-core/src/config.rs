//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Ledger refresh cadence
//! - Toggle debounce window
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/focusgate/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CoreError, StorageError};
use crate::storage::data_dir;

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusgate/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between periodic ledger refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Milliseconds rapid toggle requests are debounced for.
    #[serde(default = "default_toggle_debounce_ms")]
    pub toggle_debounce_ms: u64,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_refresh_interval_secs() -> u64 {
    60
}
fn default_toggle_debounce_ms() -> u64 {
    300
}
fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            toggle_debounce_ms: default_toggle_debounce_ms(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, StorageError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file
    /// is missing or unparsable.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config unparsable, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the configuration back to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Storage(StorageError::Decode {
                key: "config.toml".into(),
                message: e.to_string(),
            }))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
