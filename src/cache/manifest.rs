//! Chunk manifests
//!
//! A multi-chunk entry records its chunk count in `{key}.{ext}.chunks` so
//! readers need not infer it from which files exist. Entries without a
//! manifest (single-chunk, or written by older versions) fall back to
//! file-presence detection.

use super::backend::Backend;
use super::fsutil::{atomic_write, remove_if_exists};
use super::naming::manifest_path;
use crate::error::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Layout record of a multi-chunk entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkManifest {
    pub format_version: u32,
    /// Number of chunk files, indices `0..chunks`
    pub chunks: usize,
    /// Total elements across all chunks
    pub items: usize,
    pub written_at: DateTime<Utc>,
}

impl ChunkManifest {
    pub fn new(chunks: usize, items: usize) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            chunks,
            items,
            written_at: Utc::now(),
        }
    }

    /// Load the manifest for `key`, if one exists.
    ///
    /// Unreadable or unknown-version manifests are ignored with a warning so
    /// the reader falls back to file-presence detection.
    pub fn load(dir: &Path, key: &str, backend: Backend) -> CacheResult<Option<Self>> {
        let path = manifest_path(dir, key, backend);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::io(
                    format!("reading manifest {}", path.display()),
                    e,
                ))
            }
        };

        match serde_json::from_str::<Self>(&content) {
            Ok(manifest)
                if manifest.format_version == MANIFEST_FORMAT_VERSION && manifest.chunks > 0 =>
            {
                Ok(Some(manifest))
            }
            Ok(manifest) => {
                warn!(
                    "Ignoring manifest {} with format version {} and {} chunks",
                    path.display(),
                    manifest.format_version,
                    manifest.chunks
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, dir: &Path, key: &str, backend: Backend, sync_parent: bool) -> CacheResult<()> {
        let path = manifest_path(dir, key, backend);
        let content = serde_json::to_vec_pretty(self)?;
        atomic_write(&path, &content, sync_parent)
    }

    /// Remove the manifest for `key`; returns whether one existed
    pub fn remove(dir: &Path, key: &str, backend: Backend) -> CacheResult<bool> {
        remove_if_exists(&manifest_path(dir, key, backend))
    }
}
