//! In-memory tile cache with bounded size using moka.
//!
//! Moka uses lock-free data structures internally, so lookups from the
//! render path never wait on workers inserting freshly fetched tiles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use super::TileCache;
use crate::fetch::Bitmap;
use crate::job::Job;

/// Default number of tiles kept in memory.
pub const DEFAULT_CACHE_CAPACITY: u64 = 512;

/// Hit/miss counters of a [`MemoryTileCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded in-memory tile cache.
///
/// Capacity is counted in tiles. Eviction is moka's TinyLFU policy; callers
/// must not assume any particular eviction order.
pub struct MemoryTileCache {
    cache: Cache<Job, Arc<Bitmap>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryTileCache {
    /// Create a cache holding at most `capacity` tiles.
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Number of entries currently held.
    ///
    /// Runs pending maintenance first so the count reflects recent inserts.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entry_count(),
        }
    }
}

impl Default for MemoryTileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TileCache for MemoryTileCache {
    fn get(&self, job: &Job) -> Option<Arc<Bitmap>> {
        match self.cache.get(job) {
            Some(bitmap) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(bitmap)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, job: Job, bitmap: Arc<Bitmap>) {
        self.cache.insert(job, bitmap);
    }

    fn contains(&self, job: &Job) -> bool {
        self.cache.contains_key(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::source::SourceId;
    use std::thread;
    use tiny_skia::Pixmap;

    fn job(x: u32) -> Job {
        Job::new(
            TileCoord::new(x, 0, 12),
            SourceId::new("tile.example.org", 443).unwrap(),
        )
    }

    fn bitmap() -> Arc<Bitmap> {
        Arc::new(Pixmap::new(4, 4).unwrap())
    }

    #[test]
    fn test_put_then_get() {
        let cache = MemoryTileCache::new(16);
        assert!(cache.get(&job(1)).is_none());

        let stored = bitmap();
        cache.put(job(1), Arc::clone(&stored));

        let found = cache.get(&job(1)).unwrap();
        assert!(Arc::ptr_eq(&found, &stored));
        assert!(cache.contains(&job(1)));
        assert!(!cache.contains(&job(2)));
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let cache = MemoryTileCache::new(16);
        cache.put(job(1), bitmap());

        cache.get(&job(1));
        cache.get(&job(1));
        cache.get(&job(2));

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_concurrent_puts_for_distinct_keys() {
        let cache = Arc::new(MemoryTileCache::new(1024));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..32 {
                        cache.put(job(t * 100 + i), bitmap());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.entry_count(), 8 * 32);
    }
}
