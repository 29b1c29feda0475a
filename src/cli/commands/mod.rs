//! CLI command implementations
//!
//! Store operations are blocking file I/O, so each command runs them on
//! Tokio's blocking pool.

pub mod config;
pub mod get;
pub mod has;
pub mod list;
pub mod set;

pub use config::execute as config;
pub use get::execute as get;
pub use has::execute as has;
pub use list::execute as list;
pub use set::execute as set;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};

/// Open the configured store and run `op` against it off the async runtime
async fn with_store<T, F>(config: &Config, op: F) -> CacheResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CacheStore) -> CacheResult<T> + Send + 'static,
{
    let cache = config.cache.clone();
    tokio::task::spawn_blocking(move || {
        let store = CacheStore::open(&cache)?;
        op(&store)
    })
    .await
    .map_err(|e| CacheError::Internal(format!("store task failed: {e}")))?
}
