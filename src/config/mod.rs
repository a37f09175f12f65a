//! Configuration module for docview
//!
//! Manages fetch limits and output preferences.
//! Configuration is stored in the user's config directory and may be
//! overridden with `DOCVIEW_`-prefixed environment variables.

use crate::preview::DEFAULT_MAX_FILE_SIZE;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output format for the `show` command
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[derive(clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal rendering
    #[default]
    Text,
    /// Pane state and surface as JSON
    Json,
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DocviewConfig {
    /// Largest payload the pane will parse, in bytes
    pub max_file_size: u64,

    /// Rows printed per sheet in text output
    pub max_rows: usize,

    /// User agent sent with HTTP fetches
    pub user_agent: String,

    /// HTTP timeout; none means the transport's own limits apply
    pub request_timeout_secs: Option<u64>,

    /// Default output format
    pub output: OutputFormat,

    /// Colorize text output
    pub color: bool,
}

impl Default for DocviewConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_rows: 200,
            user_agent: format!("docview/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: None,
            output: OutputFormat::Text,
            color: true,
        }
    }
}

impl DocviewConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("docview").join("config.toml"))
    }

    /// Load configuration from the default location
    ///
    /// A missing file yields the defaults; environment overrides still apply.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("DOCVIEW").try_parsing(true))
            .build()?;

        settings.try_deserialize()
    }

    /// Write the default configuration to `path` unless a file is already there
    ///
    /// Returns whether a file was written.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory or file cannot be written.
    pub fn init_at(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        fs::write(path, self.to_toml()?)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Serialize to pretty TOML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))
    }

    /// Configured HTTP timeout
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
