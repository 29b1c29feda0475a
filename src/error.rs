//! Error types for memocache
//!
//! All modules use `CacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

use crate::cache::Backend;
use crate::value::Dtype;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur in memocache
#[derive(Error, Debug)]
pub enum CacheError {
    // Lookup errors
    #[error("Missing cache key {key}")]
    MissingEntry { key: String },

    #[error("Composite key has {expected} sub-keys but the producer returned {found} values")]
    ArityMismatch { expected: usize, found: usize },

    // Backend errors
    #[error("Unsupported cache backend: {0}")]
    UnsupportedBackend(String),

    #[error("Unsupported numeric dtype: {0}")]
    UnsupportedDtype(String),

    #[error("Decode options required by the {backend} backend were not supplied")]
    MissingDecodeOption { backend: Backend },

    #[error("Raw numeric data of {len} bytes is not a multiple of the {slice}-byte array size")]
    MalformedRawNumericData { len: usize, slice: usize },

    #[error("Raw numeric layout of {length} {dtype} elements does not fit in memory")]
    RawLayoutOverflow { dtype: Dtype, length: usize },

    #[error("Value cannot be encoded with the {backend} backend: {reason}")]
    UnencodableValue { backend: Backend, reason: String },

    #[error("Failed to decode {backend} data: {reason}")]
    Decode { backend: Backend, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a missing entry error for a key
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingEntry { key: key.into() }
    }

    /// Check if the caller can recover by retrying with different input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingEntry { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingEntry { .. } => Some("Store the key first, or supply a producer"),
            Self::UnsupportedBackend(_) => {
                Some("Valid backends: generic-object (pkl), compiled-code (msl), raw-numeric (bin)")
            }
            Self::MissingDecodeOption { .. } => Some("Pass --dtype and --length for raw-numeric"),
            Self::MalformedRawNumericData { .. } | Self::RawLayoutOverflow { .. } => {
                Some("Check that --dtype and --length match the values that were stored")
            }
            _ => None,
        }
    }
}
