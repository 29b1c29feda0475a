//! Persistent chunked cache
//!
//! Stores dynamic [`Value`](crate::value::Value)s as files in a single flat
//! directory. Long sequences are split into contiguous chunks which are
//! encoded and written in parallel, then joined back on read.
//!
//! # File Layout
//!
//! | File | Written when | Contents |
//! |------|--------------|----------|
//! | `{key}_0.{ext}` | always | whole value, or first chunk |
//! | `{key}_{i}.{ext}` | value was split | chunk `i` |
//! | `{key}.{ext}.chunks` | value was split | JSON [`ChunkManifest`] |
//!
//! # Backends
//!
//! | Backend | Ext | Accepts |
//! |---------|-----|---------|
//! | generic-object | `pkl` | any value |
//! | compiled-code | `msl` | primitives and containers |
//! | raw-numeric | `bin` | numeric arrays of one dtype and length |

pub mod backend;
pub mod fsutil;
pub mod manifest;
pub mod naming;
pub mod planner;
pub mod store;

pub use backend::{Backend, DecodeOptions, RawLayout};
pub use manifest::ChunkManifest;
pub use planner::ChunkPlan;
pub use store::{BulkWrite, CacheStore, EntryInfo, Options};
