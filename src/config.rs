use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::components::toast::DEFAULT_TIMEOUT;
use crate::core::pagination::DEFAULT_THRESHOLD;
use crate::remote::DEFAULT_API_URL;

pub const APP_DIR: &str = "taskpad";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_toast_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClientConfig {
    /// Base URL of the task collection.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Visible fraction of the list-end sentinel that triggers the next page.
    #[serde(default = "default_threshold")]
    pub sentinel_threshold: f64,
    #[serde(default = "default_toast_timeout_ms")]
    pub toast_timeout_ms: u64,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            sentinel_threshold: default_threshold(),
            toast_timeout_ms: default_toast_timeout_ms(),
            debug_logging: false,
        }
    }
}

impl ClientConfig {
    /// `~/.config/taskpad/config.json` or the platform equivalent.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR)
            .join("config.json")
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
