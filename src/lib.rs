//! memocache - persistent memoization cache
//!
//! Stores computed values on disk keyed by caller-chosen names, splitting
//! long sequences into chunks that are written and read in parallel.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod memo;
pub mod parallel;
pub mod value;

pub use cache::{Backend, CacheStore, DecodeOptions, Options, RawLayout};
pub use error::{CacheError, CacheResult};
pub use memo::{KeySpec, Memoizer};
pub use value::{Dtype, NumericArray, Value};
