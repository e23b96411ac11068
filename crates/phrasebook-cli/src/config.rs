//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - A `.env` file and environment variables

use crate::error::{Error, Result};
use phrasebook_core::{ModelConfig, NotificationConfig, ServiceConfig, WordLimits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Word length bounds
    pub limits: WordLimits,

    /// Model provider settings
    pub model: ModelConfig,

    /// Telegram notification settings
    pub notifications: NotificationConfig,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level used when neither -v nor RUST_LOG is given
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "YAML".to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "JSON".to_string(),
            })?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_first(&Self::default_config_paths())
    }

    /// Load the first existing file among `paths`, or defaults if none exists
    ///
    /// A file that exists but does not parse is an error, exactly as with
    /// an explicit `--config`.
    pub fn load_first(paths: &[PathBuf]) -> Result<Self> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file or default locations, then apply the environment
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = file {
            Self::from_file(path)?
        } else {
            Self::load()?
        };

        // A missing .env file is normal
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Overlay environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        let mut service = self.service();
        service.apply_env()?;
        self.limits = service.limits;
        self.model = service.model;
        self.notifications = service.notifications;

        if let Ok(format) = std::env::var("PHRASEBOOK_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// The core service configuration
    pub fn service(&self) -> ServiceConfig {
        ServiceConfig {
            limits: self.limits,
            model: self.model.clone(),
            notifications: self.notifications.clone(),
        }
    }

    /// User-level configuration file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("phrasebook").join("config.yaml"))
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("phrasebook.yaml"),
            PathBuf::from("phrasebook.yml"),
            PathBuf::from("phrasebook.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let app_dir = config_dir.join("phrasebook");
            paths.push(app_dir.join("config.yaml"));
            paths.push(app_dir.join("config.json"));
        }

        paths
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
