//! Configuration management for memocache

pub mod schema;

pub use schema::{CacheConfig, Config};

use crate::error::{CacheError, CacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Log formats `general.log_format` accepts
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Loads, validates and saves the config file, and folds command-line
/// overrides into what it loads
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
    dir_override: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self::with_path(Self::default_config_path())
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            dir_override: None,
        }
    }

    /// Make every load use `dir` as the cache directory, whatever the file
    /// says. `None` leaves the file's setting alone.
    pub fn dir_override(mut self, dir: Option<PathBuf>) -> Self {
        self.dir_override = dir;
        self
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memocache")
            .join("config.toml")
    }

    /// Load configuration, using defaults if the file does not exist, then
    /// apply the directory override
    pub async fn load(&self) -> CacheResult<Config> {
        let mut config = if self.config_path.exists() {
            self.load_from_file(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            Config::default()
        };

        if let Some(dir) = &self.dir_override {
            debug!("Cache directory overridden: {}", dir.display());
            config.cache.dir = Some(dir.clone());
        }
        Ok(config)
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> CacheResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CacheError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| CacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        validate(&config).map_err(|reason| CacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Write a default config unless one exists. Returns whether a file
    /// was written.
    pub async fn init(&self, force: bool) -> CacheResult<bool> {
        if self.config_path.exists() && !force {
            debug!("Keeping existing config at {}", self.config_path.display());
            return Ok(false);
        }
        self.save(&Config::default()).await?;
        Ok(true)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> CacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> CacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

/// Reject settings that parse but cannot be used
fn validate(config: &Config) -> Result<(), String> {
    if config.cache.workers == Some(0) {
        return Err("cache.workers must be at least 1 (omit it to use every core)".into());
    }
    if !LOG_FORMATS.contains(&config.general.log_format.as_str()) {
        return Err(format!(
            "general.log_format must be one of {}, got {:?}",
            LOG_FORMATS.join(", "),
            config.general.log_format
        ));
    }
    Ok(())
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
