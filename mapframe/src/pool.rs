//! Fixed-size worker pool fetching tiles into the cache.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────────────────────────┐
//! │   JobQueue   │────►│ tile-worker-0 .. tile-worker-(N-1)           │
//! └──────────────┘     │   pop ─► fetch ─► cache.put ─► request_redraw │
//!                      │            └─► (error) warn, drop job         │
//!                      └──────────────────────────────────────────────┘
//! ```
//!
//! The pool size is the source's parallelism limit clamped to
//! [`HARD_WORKER_CAP`]. A failed job is logged and abandoned: there is no
//! retry or backoff, the tile simply stays absent from the cache until a
//! later redraw submits it again.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::cache::TileCache;
use crate::fetch::TileFetcher;
use crate::job::Job;
use crate::queue::JobQueue;
use crate::source::TileSource;

/// Upper bound on worker threads regardless of what a source declares.
pub const HARD_WORKER_CAP: usize = 8;

/// Number of workers for a declared parallelism limit.
///
/// Limits above the cap are clamped, never rejected; a limit of zero still
/// yields one worker.
pub fn pool_size(parallelism_limit: usize) -> usize {
    parallelism_limit.clamp(1, HARD_WORKER_CAP)
}

/// Receiver of "the cache changed, render again" notifications.
pub trait RedrawSignal: Send + Sync {
    fn request_redraw(&self);
}

impl<F> RedrawSignal for F
where
    F: Fn() + Send + Sync,
{
    fn request_redraw(&self) {
        self()
    }
}

/// Everything a worker thread needs, shared by all workers.
struct WorkerContext {
    source: Arc<dyn TileSource>,
    fetcher: Arc<dyn TileFetcher>,
    queue: Arc<JobQueue>,
    cache: Arc<dyn TileCache>,
    redraw: Arc<dyn RedrawSignal>,
}

impl WorkerContext {
    fn run(&self, worker: usize) {
        debug!(worker, "Tile worker started");

        while let Some(job) = self.queue.pop() {
            self.process(worker, &job);
            self.queue.complete(&job);
        }

        debug!(worker, "Tile worker stopped");
    }

    fn process(&self, worker: usize, job: &Job) {
        if self.cache.contains(job) {
            trace!(worker, job = %job, "Tile already cached, skipping fetch");
            return;
        }
        match self.fetcher.fetch(job, self.source.as_ref()) {
            Ok(bitmap) => {
                debug!(worker, job = %job, "Tile fetched");
                self.cache.put(job.clone(), Arc::new(bitmap));
                self.redraw.request_redraw();
            }
            Err(e) => {
                warn!(worker, job = %job, kind = e.kind(), error = %e, "Tile fetch failed, dropping job");
            }
        }
    }
}

/// Pool of worker threads draining a [`JobQueue`].
///
/// Dropping the pool shuts it down.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkerPool {
    /// Spawns the workers.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create a thread.
    pub fn start(
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn TileFetcher>,
        queue: Arc<JobQueue>,
        cache: Arc<dyn TileCache>,
        redraw: Arc<dyn RedrawSignal>,
    ) -> Self {
        let size = pool_size(source.parallelism_limit());
        info!(
            source = %source.id(),
            declared = source.parallelism_limit(),
            workers = size,
            "Starting tile worker pool"
        );

        let context = Arc::new(WorkerContext {
            source,
            fetcher,
            queue: Arc::clone(&queue),
            cache,
            redraw,
        });

        let handles = (0..size)
            .map(|i| {
                let context = Arc::clone(&context);
                thread::Builder::new()
                    .name(format!("tile-worker-{}", i))
                    .spawn(move || context.run(i))
                    .expect("Failed to spawn tile worker thread")
            })
            .collect();

        Self {
            queue,
            handles: Mutex::new(handles),
            size,
        }
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Enqueues a job. Returns false if it was already pending or the pool
    /// is shut down.
    pub fn submit(&self, job: Job) -> bool {
        self.queue.push(job)
    }

    /// True once [`WorkerPool::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.queue.is_closed() && self.handles.lock().is_empty()
    }

    /// Interrupts every worker and waits for them to exit.
    ///
    /// Workers blocked on the queue return immediately; a worker in the
    /// middle of a fetch finishes that fetch (bounded by the HTTP timeouts)
    /// and exits. Calling this more than once is harmless.
    pub fn shutdown(&self) {
        self.queue.close();

        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        if handles.is_empty() {
            return;
        }

        for handle in handles {
            if handle.join().is_err() {
                warn!("Tile worker panicked");
            }
        }
        info!(workers = self.size, "Tile worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("queue", &self.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTileCache;
    use crate::coord::TileCoord;
    use crate::error::FetchError;
    use crate::fetch::Bitmap;
    use crate::source::TemplateSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tiny_skia::Pixmap;

    fn source(limit: usize) -> Arc<dyn TileSource> {
        Arc::new(
            TemplateSource::builder("tile.example.org", 443)
                .parallelism_limit(limit)
                .build()
                .unwrap(),
        )
    }

    fn job(x: u32) -> Job {
        Job::new(
            TileCoord::new(x, 0, 10),
            TemplateSource::builder("tile.example.org", 443)
                .build()
                .unwrap()
                .id()
                .clone(),
        )
    }

    /// Fetcher that fails for selected tile columns.
    struct ScriptedFetcher {
        failing: Vec<u32>,
        calls: AtomicUsize,
    }

    impl TileFetcher for ScriptedFetcher {
        fn fetch(&self, job: &Job, _source: &dyn TileSource) -> Result<Bitmap, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&job.tile().x) {
                return Err(FetchError::Network("simulated".to_string()));
            }
            Ok(Pixmap::new(1, 1).unwrap())
        }
    }

    #[test]
    fn test_pool_size_clamped() {
        assert_eq!(pool_size(3), 3);
        assert_eq!(pool_size(8), 8);
        assert_eq!(pool_size(20), 8);
        assert_eq!(pool_size(0), 1);
    }

    #[test]
    fn test_start_spawns_clamped_worker_count() {
        for (limit, expected) in [(3, 3), (8, 8), (20, 8)] {
            let pool = WorkerPool::start(
                source(limit),
                Arc::new(ScriptedFetcher {
                    failing: vec![],
                    calls: AtomicUsize::new(0),
                }),
                Arc::new(JobQueue::new()),
                Arc::new(MemoryTileCache::new(16)),
                Arc::new(|| {}),
            );
            assert_eq!(pool.size(), expected);
            assert_eq!(pool.handles.lock().len(), expected);
        }
    }

    #[test]
    fn test_failed_job_is_dropped_and_pool_continues() {
        let cache = Arc::new(MemoryTileCache::new(16));
        let redraws = Arc::new(AtomicUsize::new(0));
        let fetcher = Arc::new(ScriptedFetcher {
            failing: vec![2],
            calls: AtomicUsize::new(0),
        });

        let pool = {
            let redraws = Arc::clone(&redraws);
            WorkerPool::start(
                source(1),
                fetcher.clone(),
                Arc::new(JobQueue::new()),
                cache.clone(),
                Arc::new(move || {
                    redraws.fetch_add(1, Ordering::SeqCst);
                }),
            )
        };

        for x in 0..4 {
            assert!(pool.submit(job(x)));
        }
        assert!(pool.queue().wait_idle(Duration::from_secs(5)));

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        assert_eq!(redraws.load(Ordering::SeqCst), 3);
        assert!(cache.get(&job(2)).is_none());
        assert_eq!(cache.entry_count(), 3);
    }

    #[test]
    fn test_cached_job_is_not_fetched_again() {
        let cache = Arc::new(MemoryTileCache::new(16));
        cache.put(job(7), Arc::new(Pixmap::new(1, 1).unwrap()));
        let redraws = Arc::new(AtomicUsize::new(0));
        let fetcher = Arc::new(ScriptedFetcher {
            failing: vec![],
            calls: AtomicUsize::new(0),
        });

        let pool = {
            let redraws = Arc::clone(&redraws);
            WorkerPool::start(
                source(1),
                fetcher.clone(),
                Arc::new(JobQueue::new()),
                cache.clone(),
                Arc::new(move || {
                    redraws.fetch_add(1, Ordering::SeqCst);
                }),
            )
        };

        assert!(pool.submit(job(7)));
        assert!(pool.queue().wait_idle(Duration::from_secs(5)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(redraws.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_is_prompt_and_idempotent() {
        let pool = WorkerPool::start(
            source(4),
            Arc::new(ScriptedFetcher {
                failing: vec![],
                calls: AtomicUsize::new(0),
            }),
            Arc::new(JobQueue::new()),
            Arc::new(MemoryTileCache::new(16)),
            Arc::new(|| {}),
        );

        let started = Instant::now();
        pool.shutdown();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(pool.is_shut_down());

        pool.shutdown();
        assert!(!pool.submit(job(1)));
    }

    #[test]
    fn test_closure_redraw_signal() {
        let count = AtomicUsize::new(0);
        let signal = || {
            count.fetch_add(1, Ordering::SeqCst);
        };
        signal.request_redraw();
        signal.request_redraw();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
