//! Tile cache capability.
//!
//! The pipeline only ever calls [`TileCache::get`] and [`TileCache::put`].
//! Capacity, eviction order and persistence belong to the implementation,
//! which is injected by whoever composes the pipeline; there is no
//! process-wide cache.

mod memory;

pub use memory::{CacheStats, MemoryTileCache, DEFAULT_CACHE_CAPACITY};

use std::sync::Arc;

use crate::fetch::Bitmap;
use crate::job::Job;

/// Concurrency-safe key/value store for decoded tiles.
///
/// Workers call `put` for distinct keys concurrently and the render path
/// calls `get` at the same time; implementations are responsible for making
/// that safe.
pub trait TileCache: Send + Sync {
    /// Looks up the bitmap for `job`.
    fn get(&self, job: &Job) -> Option<Arc<Bitmap>>;

    /// Stores the bitmap for `job`, replacing any previous entry.
    fn put(&self, job: Job, bitmap: Arc<Bitmap>);

    /// Returns true if an entry for `job` is present.
    fn contains(&self, job: &Job) -> bool {
        self.get(job).is_some()
    }
}
