//! Configuration schema for memocache
//!
//! Configuration is stored at `~/.config/memocache/config.toml`

use crate::cache::Backend;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Default number of chunks a sequence is split into
pub const DEFAULT_CHUNKS: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(n) => n,
    None => unreachable!(),
};

/// Cache directory used when none is configured, relative to home
pub const DEFAULT_CACHE_DIR_NAME: &str = ".memocache";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache store settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache store settings, consumed by [`crate::cache::CacheStore::open`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (default: `~/.memocache`)
    pub dir: Option<PathBuf>,

    /// Backend used when a call does not name one
    pub backend: Backend,

    /// Chunk count used when a call does not name one
    pub chunks: NonZeroUsize,

    /// Worker threads for chunk writes (default: available parallelism)
    pub workers: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            backend: Backend::GenericObject,
            chunks: DEFAULT_CHUNKS,
            workers: None,
        }
    }
}

impl CacheConfig {
    /// Config for a specific directory with default settings
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Configured directory, or `~/.memocache`
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_CACHE_DIR_NAME)
        })
    }
}
