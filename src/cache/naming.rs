//! Chunk file naming
//!
//! Every cache entry lives in one flat directory as `{key}_{index}.{ext}`.
//! Keys are not escaped; callers supply filesystem-safe keys.

use super::backend::Backend;
use std::path::{Path, PathBuf};

/// Suffix appended to `{key}.{ext}` for chunk manifests
pub const MANIFEST_SUFFIX: &str = "chunks";

/// Path of chunk `index` of `key`
pub fn chunk_path(dir: &Path, key: &str, index: usize, backend: Backend) -> PathBuf {
    dir.join(format!("{}_{}.{}", key, index, backend.extension()))
}

/// Check whether chunk `index` of `key` exists as a regular file
pub fn chunk_exists(dir: &Path, key: &str, index: usize, backend: Backend) -> bool {
    chunk_path(dir, key, index, backend).is_file()
}

/// Path of the chunk manifest of a multi-chunk entry
pub fn manifest_path(dir: &Path, key: &str, backend: Backend) -> PathBuf {
    dir.join(format!(
        "{}.{}.{}",
        key,
        backend.extension(),
        MANIFEST_SUFFIX
    ))
}

/// A parsed chunk file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    pub key: String,
    pub index: usize,
    pub backend: Backend,
}

/// Parse a file name produced by [`chunk_path`].
///
/// Returns `None` for manifests, temp files and anything else that is not a
/// chunk file. Keys may themselves contain `_`; the index is whatever follows
/// the last one.
pub fn parse_chunk_file_name(name: &str) -> Option<ChunkFile> {
    let (stem, ext) = name.rsplit_once('.')?;
    let backend = Backend::from_extension(ext)?;
    let (key, index) = stem.rsplit_once('_')?;
    if key.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(ChunkFile {
        key: key.to_string(),
        index: index.parse().ok()?,
        backend,
    })
}
