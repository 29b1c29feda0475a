//! Chunked on-disk cache store
//!
//! One flat directory holds every entry. Values are stored whole in chunk 0,
//! or, for long enough sequences, split into contiguous chunks that are
//! encoded and written in parallel. Each file is replaced atomically, but a
//! multi-chunk `set` as a whole is not: a crash midway can leave a mix of old
//! and new chunks.

use super::backend::{Backend, DecodeOptions};
use super::fsutil::{atomic_write, remove_if_exists, sync_dir_best_effort};
use super::manifest::ChunkManifest;
use super::naming::{chunk_exists, chunk_path, manifest_path, parse_chunk_file_name};
use super::planner::ChunkPlan;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::parallel::{default_workers, ParallelExecutor};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Upper bound on reader threads for one multi-chunk `get`
const MAX_READ_WORKERS: usize = 64;

/// Per-call overrides of the store defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub backend: Option<Backend>,
    pub chunks: Option<NonZeroUsize>,
    /// Only read by `get`
    pub decode: DecodeOptions,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn chunks(mut self, chunks: NonZeroUsize) -> Self {
        self.chunks = Some(chunks);
        self
    }

    pub fn decode(mut self, decode: impl Into<DecodeOptions>) -> Self {
        self.decode = decode.into();
        self
    }
}

/// Summary of one entry found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub key: String,
    pub backend: Backend,
    /// Chunk files present
    pub chunks: usize,
    /// Total size of the chunk files
    pub bytes: u64,
    /// Whether a chunk manifest accompanies the entry
    pub manifest: bool,
}

/// Persistent key/value store backed by chunk files
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
    default_backend: Backend,
    default_chunks: NonZeroUsize,
    executor: ParallelExecutor,
}

impl CacheStore {
    /// Open (creating if needed) the cache directory described by `config`
    pub fn open(config: &CacheConfig) -> CacheResult<Self> {
        let dir = config.resolved_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| CacheError::io(format!("creating cache dir {}", dir.display()), e))?;

        let executor = ParallelExecutor::new(config.workers.unwrap_or_else(default_workers));
        info!(
            "Opened cache at {} (backend: {}, chunks: {}, workers: {})",
            dir.display(),
            config.backend,
            config.chunks,
            executor.workers()
        );

        Ok(Self {
            dir,
            default_backend: config.backend,
            default_chunks: config.chunks,
            executor,
        })
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn default_backend(&self) -> Backend {
        self.default_backend
    }

    pub fn default_chunks(&self) -> NonZeroUsize {
        self.default_chunks
    }

    /// Backend a call with `options` uses
    pub fn backend_for(&self, options: &Options) -> Backend {
        options.backend.unwrap_or(self.default_backend)
    }

    /// Check whether chunk `index` of `key` exists
    pub fn has(&self, key: &str, index: usize, backend: Backend) -> bool {
        chunk_exists(&self.dir, key, index, backend)
    }

    /// Store `value` under `key`, replacing whatever the same backend
    /// stored there before
    pub fn set(&self, key: &str, value: &Value, options: &Options) -> CacheResult<()> {
        self.write_entry(key, value, options, true)
    }

    /// Write every file of an entry. The directory is fsynced once at the
    /// end when `sync_dir` is set.
    fn write_entry(
        &self,
        key: &str,
        value: &Value,
        options: &Options,
        sync_dir: bool,
    ) -> CacheResult<()> {
        let backend = self.backend_for(options);
        let chunks = options.chunks.unwrap_or(self.default_chunks);
        let plan = ChunkPlan::for_value(value, chunks);
        let previous = ChunkManifest::load(&self.dir, key, backend)?.map(|m| m.chunks);

        match plan {
            ChunkPlan::Whole => {
                self.write_chunk(key, 0, backend, value, false)?;
                ChunkManifest::remove(&self.dir, key, backend)?;
            }
            ChunkPlan::Split { len, chunks, .. } => {
                let results = self.executor.map((0..chunks.get()).collect(), |index| {
                    self.write_chunk(key, index, backend, &plan.part(value, index), false)
                });
                results.into_iter().collect::<CacheResult<Vec<()>>>()?;
                ChunkManifest::new(chunks.get(), len).save(&self.dir, key, backend, false)?;
            }
        }

        let removed = self.remove_stale_chunks(key, backend, plan.chunk_count(), previous)?;
        if sync_dir {
            sync_dir_best_effort(&self.dir);
        }
        debug!(
            "Stored {} as {} chunk(s) with {} ({} stale removed)",
            key,
            plan.chunk_count(),
            backend,
            removed
        );
        Ok(())
    }

    /// Load the value stored under `key`.
    ///
    /// The chunk count comes from the entry's manifest when there is one.
    /// Otherwise an existing chunk 1 marks a multi-chunk entry of
    /// `options.chunks` (or the default) chunks, and its absence a single
    /// file at chunk 0.
    pub fn get(&self, key: &str, options: &Options) -> CacheResult<Value> {
        let backend = self.backend_for(options);
        let chunks = match ChunkManifest::load(&self.dir, key, backend)? {
            Some(manifest) => manifest.chunks,
            None if self.has(key, 1, backend) => {
                options.chunks.unwrap_or(self.default_chunks).get()
            }
            None => 1,
        };

        if chunks == 1 {
            let value = self.read_chunk(key, 0, backend, &options.decode)?;
            debug!("Loaded {} from a single chunk with {}", key, backend);
            return Ok(value);
        }

        let readers = ParallelExecutor::new(chunks.min(MAX_READ_WORKERS));
        let parts = readers
            .map((0..chunks).collect(), |index| {
                self.read_chunk(key, index, backend, &options.decode)
            })
            .into_iter()
            .collect::<CacheResult<Vec<Value>>>()?;

        debug!("Loaded {} from {} chunks with {}", key, chunks, backend);
        Ok(Value::concat(parts))
    }

    /// List every entry in the cache directory, sorted by key and backend
    pub fn entries(&self) -> CacheResult<Vec<EntryInfo>> {
        let read_dir = fs::read_dir(&self.dir)
            .map_err(|e| CacheError::io(format!("listing {}", self.dir.display()), e))?;

        let mut grouped: BTreeMap<(String, Backend), (usize, u64)> = BTreeMap::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| CacheError::io("reading directory entry", e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(chunk) = parse_chunk_file_name(name) else {
                continue;
            };
            let meta = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };

            let slot = grouped.entry((chunk.key, chunk.backend)).or_default();
            slot.0 += 1;
            slot.1 += meta.len();
        }

        Ok(grouped
            .into_iter()
            .map(|((key, backend), (chunks, bytes))| EntryInfo {
                manifest: manifest_path(&self.dir, &key, backend).is_file(),
                key,
                backend,
                chunks,
                bytes,
            })
            .collect())
    }

    /// Start a batch of writes that share one directory fsync.
    ///
    /// Only writes made through [`BulkWrite::set`] are deferred; the
    /// directory is synced once when the guard drops. Plain `set` calls,
    /// from this thread or any other, keep syncing on their own.
    pub fn bulk_write(&self) -> BulkWrite<'_> {
        BulkWrite {
            store: self,
            deferred: AtomicUsize::new(0),
        }
    }

    fn write_chunk(
        &self,
        key: &str,
        index: usize,
        backend: Backend,
        value: &Value,
        sync_parent: bool,
    ) -> CacheResult<()> {
        let bytes = backend.encode(value)?;
        atomic_write(&chunk_path(&self.dir, key, index, backend), &bytes, sync_parent)
    }

    fn read_chunk(
        &self,
        key: &str,
        index: usize,
        backend: Backend,
        decode: &DecodeOptions,
    ) -> CacheResult<Value> {
        let path = chunk_path(&self.dir, key, index, backend);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && index == 0 => {
                return Err(CacheError::missing(key));
            }
            Err(e) => {
                return Err(CacheError::io(
                    format!("reading chunk {} of {}", index, key),
                    e,
                ))
            }
        };
        backend.decode(&bytes, decode)
    }

    /// Delete chunk files at `keep` and above left over from an earlier
    /// write with more chunks. Without a manifest the scan stops at the
    /// first missing index.
    fn remove_stale_chunks(
        &self,
        key: &str,
        backend: Backend,
        keep: usize,
        previous: Option<usize>,
    ) -> CacheResult<usize> {
        let known = previous.unwrap_or(0);
        let mut removed = 0;
        let mut index = keep;
        loop {
            let existed = remove_if_exists(&chunk_path(&self.dir, key, index, backend))?;
            if existed {
                removed += 1;
            } else if index >= known {
                break;
            }
            index += 1;
        }
        Ok(removed)
    }
}

/// Batch of writes returned by [`CacheStore::bulk_write`]
#[must_use = "deferred writes are synced when the guard is dropped"]
#[derive(Debug)]
pub struct BulkWrite<'a> {
    store: &'a CacheStore,
    deferred: AtomicUsize,
}

impl BulkWrite<'_> {
    /// Like [`CacheStore::set`], but leaves the directory fsync to the
    /// guard
    pub fn set(&self, key: &str, value: &Value, options: &Options) -> CacheResult<()> {
        self.store.write_entry(key, value, options, false)?;
        self.deferred.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Entries written through this guard so far
    pub fn deferred(&self) -> usize {
        self.deferred.load(Ordering::Relaxed)
    }
}

impl Drop for BulkWrite<'_> {
    fn drop(&mut self) {
        if self.deferred() > 0 {
            sync_dir_best_effort(&self.store.dir);
        }
    }
}
