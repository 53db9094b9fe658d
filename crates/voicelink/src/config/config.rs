//! Configuration management for voicelink.
//!
//! Handles loading and saving the JSON configuration file with
//! cross-platform paths, default merging for partial files, and atomic
//! write operations. Reads are fresh from disk on every call so config
//! stays consistent across component boundaries.

use crate::{
    AppError, AppResult,
    config::{DEFAULT_SOCKET_FILE, HotkeyBinding, default_hotkeys},
};

use std::{fs, io::Write, panic::Location, path::PathBuf};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

/// Main configuration struct.
///
/// Every field carries a serde default so a persisted-but-partial file
/// merges with defaults instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Auth token for the recognition backend, if signed in.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Hotkey bindings pushed to the helper.
    #[serde(default = "default_hotkeys")]
    pub hotkeys: Vec<HotkeyBinding>,
    /// Override for the helper socket path; temp-dir default otherwise.
    #[serde(default)]
    pub helper_socket_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_token: None,
            hotkeys: default_hotkeys(),
            helper_socket_path: None,
        }
    }
}

impl Config {
    /// The socket path the helper connects to.
    pub fn socket_path(&self) -> PathBuf {
        self.helper_socket_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SOCKET_FILE))
    }

    /// The credentials + hotkey payload carried by an `init_config` push.
    pub fn helper_payload(&self) -> serde_json::Value {
        json!({
            "auth_token": self.auth_token,
            "hotkeys": self.hotkeys,
        })
    }
}

/// Partial configuration update from the renderer.
///
/// `Some` fields override, absent fields leave the persisted value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    /// New auth token.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Replacement hotkey bindings.
    #[serde(default)]
    pub hotkeys: Option<Vec<HotkeyBinding>>,
    /// New helper socket path override.
    #[serde(default)]
    pub helper_socket_path: Option<PathBuf>,
}

/// Loads and saves the config file.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Create a manager for the default per-user config location.
    #[track_caller]
    pub fn new() -> AppResult<Self> {
        let proj_dirs =
            ProjectDirs::from("com", "voicelink", "Voicelink").ok_or_else(|| {
                AppError::ConfigError {
                    reason: "Failed to get config directory".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(Self {
            path: config_dir.join("config.json"),
        })
    }

    /// Create a manager for an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the current configuration from disk.
    ///
    /// Missing files yield defaults; corrupt or unreadable files fall back
    /// to defaults with a warning rather than failing. Every call re-reads
    /// the file, trading a small IO cost for freshness.
    #[instrument(skip(self))]
    pub fn get(&self) -> Config {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = ?self.path, error = %e, "Corrupt config file, using defaults");
                    Config::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No config file, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Unreadable config file, using defaults");
                Config::default()
            }
        }
    }

    /// Apply a partial update and persist the merged result.
    #[track_caller]
    #[instrument(skip(self, patch))]
    pub fn update(&self, patch: ConfigPatch) -> AppResult<Config> {
        let mut config = self.get();

        if let Some(auth_token) = patch.auth_token {
            config.auth_token = Some(auth_token);
        }
        if let Some(hotkeys) = patch.hotkeys {
            config.hotkeys = hotkeys;
        }
        if let Some(path) = patch.helper_socket_path {
            config.helper_socket_path = Some(path);
        }

        self.save(&config)?;
        Ok(config)
    }

    /// Save configuration to disk using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self, config))]
    pub fn save(&self, config: &Config) -> AppResult<()> {
        let contents =
            serde_json::to_string_pretty(config).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to serialize config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        // Atomic write: write to temp file then rename
        let temp_path = self.path.with_extension("json.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?self.path, "Configuration saved (atomic write)");

        Ok(())
    }
}
