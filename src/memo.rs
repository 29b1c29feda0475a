//! Compute-if-absent memoization over a [`CacheStore`]
//!
//! A [`Memoizer`] answers "give me the value for this key", calling a
//! producer only when the key is not cached yet (or when asked to recompute)
//! and storing what it returns. Composite keys group several independent
//! entries that are produced together by one producer call.

use crate::cache::{Backend, CacheStore, DecodeOptions, Options};
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::value::Value;
use tracing::{debug, info};

/// One member of a composite key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    pub key: String,
    pub backend: Backend,
    pub decode: DecodeOptions,
}

impl KeySpec {
    pub fn new(key: impl Into<String>, backend: Backend) -> Self {
        Self {
            key: key.into(),
            backend,
            decode: DecodeOptions::None,
        }
    }

    pub fn decode(mut self, decode: impl Into<DecodeOptions>) -> Self {
        self.decode = decode.into();
        self
    }

    fn options(&self) -> Options {
        Options::new().backend(self.backend).decode(self.decode)
    }
}

/// Memoization front end of a cache store
#[derive(Debug)]
pub struct Memoizer {
    store: CacheStore,
}

impl Memoizer {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Open a store for `config` and wrap it
    pub fn open(config: &CacheConfig) -> CacheResult<Self> {
        CacheStore::open(config).map(Self::new)
    }

    /// Underlying store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Cached value of `key`; fails with `MissingEntry` when absent
    pub fn get(&self, key: &str, options: &Options) -> CacheResult<Value> {
        self.store.get(key, options)
    }

    /// Cached value of `key`, or the result of `producer` after storing it.
    ///
    /// The produced value is returned as is, not re-read from disk.
    pub fn get_or_compute<F>(&self, key: &str, options: &Options, producer: F) -> CacheResult<Value>
    where
        F: FnOnce() -> Value,
    {
        let backend = self.store.backend_for(options);
        if self.store.has(key, 0, backend) {
            debug!("Cache hit for {}", key);
            return self.store.get(key, options);
        }
        debug!("Cache miss for {}", key);
        self.recompute(key, options, producer)
    }

    /// Call `producer` unconditionally and overwrite the cached value
    pub fn recompute<F>(&self, key: &str, options: &Options, producer: F) -> CacheResult<Value>
    where
        F: FnOnce() -> Value,
    {
        let value = producer();
        self.store.set(key, &value, options)?;
        info!("Computed and stored {}", key);
        Ok(value)
    }

    /// Cached values of every key in `specs`, in order
    pub fn get_all(&self, specs: &[KeySpec]) -> CacheResult<Vec<Value>> {
        specs
            .iter()
            .map(|spec| self.store.get(&spec.key, &spec.options()))
            .collect()
    }

    /// Cached values of `specs`, or the results of one `producer` call if any
    /// key is missing.
    ///
    /// The producer must return one value per key, in key order.
    pub fn get_all_or_compute<F>(&self, specs: &[KeySpec], producer: F) -> CacheResult<Vec<Value>>
    where
        F: FnOnce() -> Vec<Value>,
    {
        let missing = specs
            .iter()
            .find(|spec| !self.store.has(&spec.key, 0, spec.backend));
        match missing {
            None => {
                debug!("Cache hit for all {} keys", specs.len());
                self.get_all(specs)
            }
            Some(spec) => {
                debug!("Cache miss for {}, recomputing {} keys", spec.key, specs.len());
                self.recompute_all(specs, producer)
            }
        }
    }

    /// Call `producer` unconditionally and overwrite every key in `specs`.
    ///
    /// Nothing is written if the producer returns the wrong number of
    /// values.
    pub fn recompute_all<F>(&self, specs: &[KeySpec], producer: F) -> CacheResult<Vec<Value>>
    where
        F: FnOnce() -> Vec<Value>,
    {
        let values = producer();
        if values.len() != specs.len() {
            return Err(CacheError::ArityMismatch {
                expected: specs.len(),
                found: values.len(),
            });
        }

        let bulk = self.store.bulk_write();
        for (spec, value) in specs.iter().zip(&values) {
            bulk.set(&spec.key, value, &spec.options())?;
        }
        info!("Computed and stored {} keys", specs.len());
        Ok(values)
    }
}

impl From<CacheStore> for Memoizer {
    fn from(store: CacheStore) -> Self {
        Self::new(store)
    }
}
