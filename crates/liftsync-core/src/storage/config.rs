//! TOML-based sync configuration.
//!
//! Names the remote spreadsheet and its two log tables, the API endpoint and
//! the local database file. Stored at `~/.config/liftsync/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use super::data_dir;
use crate::error::ConfigError;

/// Sync configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// ID of the remote spreadsheet holding both logs.
    #[serde(default)]
    pub spreadsheet_id: String,
    /// Tab holding the strength session log.
    #[serde(default = "default_session_sheet")]
    pub session_sheet: String,
    /// Tab holding the cardio log.
    #[serde(default = "default_cardio_sheet")]
    pub cardio_sheet: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// SQLite file for the cache, the pending queue and the last token,
    /// relative to the data directory unless absolute.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_session_sheet() -> String {
    "Log".into()
}
fn default_cardio_sheet() -> String {
    "Cardio".into()
}
fn default_api_base_url() -> String {
    "https://sheets.googleapis.com".into()
}
fn default_database_file() -> String {
    "liftsync.db".into()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            session_sheet: default_session_sheet(),
            cardio_sheet: default_cardio_sheet(),
            api_base_url: default_api_base_url(),
            database_file: default_database_file(),
        }
    }
}

impl SyncConfig {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/liftsync"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults there if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Check the values needed before any network call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "spreadsheet_id".into(),
                message: "must not be empty".into(),
            });
        }
        for (key, sheet) in [
            ("session_sheet", &self.session_sheet),
            ("cardio_sheet", &self.cardio_sheet),
        ] {
            if sheet.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must not be empty".into(),
                });
            }
        }
        self.api_url()?;
        Ok(())
    }

    /// Parsed API base URL.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api_base_url".into(),
            message: e.to_string(),
        })
    }

    /// Absolute path of the local database.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        let file = Path::new(&self.database_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            data_dir.join(file)
        }
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        json.get(key)?.as_str().map(str::to_string)
    }

    /// Set a config value by key. Does not persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let slot = match key {
            "spreadsheet_id" => &mut self.spreadsheet_id,
            "session_sheet" => &mut self.session_sheet,
            "cardio_sheet" => &mut self.cardio_sheet,
            "api_base_url" => &mut self.api_base_url,
            "database_file" => &mut self.database_file,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "unknown config key".into(),
                })
            }
        };
        *slot = value.to_string();
        Ok(())
    }
}
