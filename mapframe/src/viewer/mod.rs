//! Composition root of the tile pipeline.
//!
//! [`MapViewer::start`] assembles every component and wires the listeners:
//!
//! ```text
//! ViewModel ──► FrameBufferController ──► FrameBuffer ◄── host draws
//!     │    └──► RedrawController ──► LayerManager ──► TileLayer ──► JobQueue
//!     └───────► RepaintController ──► HostSurface           ▲            │
//!                                                            │            ▼
//!                                       redraw ◄── TileCache ◄── WorkerPool
//! ```
//!
//! The host mutates the view through [`MapViewer::view`] and paints with
//! [`MapViewer::draw`] when asked to repaint.

mod config;
mod error;

pub use config::ViewerConfig;
pub use error::ViewerError;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tiny_skia::PixmapMut;
use tracing::info;

use crate::cache::TileCache;
use crate::controller::{FrameBufferController, RedrawController, RepaintController};
use crate::coord::{Projection, WebMercator};
use crate::fetch::{Bitmap, Fetcher, ImageDecoder, ReqwestClient, TileFetcher};
use crate::frame::FrameBuffer;
use crate::job::Job;
use crate::layer::{LayerManager, TileLayer};
use crate::model::{Model, ViewModel};
use crate::observer::Observer;
use crate::pool::{RedrawSignal, WorkerPool};
use crate::queue::JobQueue;
use crate::source::TileSource;
use crate::surface::HostSurface;

/// A running tile pipeline bound to one source.
pub struct MapViewer {
    source: Arc<dyn TileSource>,
    view: Arc<ViewModel>,
    frame_buffer_controller: Arc<FrameBufferController>,
    redraw_controller: Arc<dyn Observer>,
    repaint_controller: Arc<dyn Observer>,
    layers: Arc<LayerManager>,
    queue: Arc<JobQueue>,
    pool: WorkerPool,
}

impl MapViewer {
    /// Starts a viewer fetching over HTTP with the configured timeouts.
    ///
    /// # Errors
    ///
    /// [`ViewerError::Config`] if the configuration is invalid or the HTTP
    /// client cannot be created.
    pub fn start(
        config: ViewerConfig,
        source: Arc<dyn TileSource>,
        cache: Arc<dyn TileCache>,
        host: Arc<dyn HostSurface>,
    ) -> Result<Self, ViewerError> {
        config.validate()?;
        let client = ReqwestClient::with_timeouts(config.connect_timeout, config.read_timeout)?;
        let fetcher = Arc::new(Fetcher::new(Arc::new(client), Arc::new(ImageDecoder)));
        Self::start_with_fetcher(config, source, fetcher, cache, host)
    }

    /// Starts a viewer with an explicit fetcher.
    pub fn start_with_fetcher(
        config: ViewerConfig,
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn TileFetcher>,
        cache: Arc<dyn TileCache>,
        host: Arc<dyn HostSurface>,
    ) -> Result<Self, ViewerError> {
        config.validate()?;

        let projection: Arc<dyn Projection> = Arc::new(WebMercator::default());
        let view = Arc::new(ViewModel::new(
            config.overdraw_factor,
            config.zoom_min,
            config.zoom_max,
        )?);
        let queue = Arc::new(JobQueue::new());

        let frame_buffer_controller = Arc::new(FrameBufferController::new(
            Arc::new(FrameBuffer::new()),
            &view,
            Arc::clone(&projection),
        ));

        let layers = Arc::new(LayerManager::new(
            Arc::clone(&view),
            Arc::clone(&frame_buffer_controller),
            Arc::clone(&projection),
            Arc::clone(&host),
            config.background,
        ));
        layers.add_layer(Arc::new(TileLayer::new(
            Arc::clone(&source),
            Arc::clone(&cache),
            Arc::clone(&queue),
            Arc::clone(&projection),
        )));

        let redraw: Arc<dyn RedrawSignal> = layers.clone();
        let redraw_controller: Arc<dyn Observer> = Arc::new(RedrawController::new(&redraw));
        let repaint_controller: Arc<dyn Observer> = Arc::new(RepaintController::new(host));

        view.add_observer_all(frame_buffer_controller.clone())?;
        view.add_observer_all(Arc::clone(&redraw_controller))?;
        view.position().add_observer(Arc::clone(&repaint_controller))?;

        let pool = WorkerPool::start(
            Arc::clone(&source),
            fetcher,
            Arc::clone(&queue),
            cache,
            redraw,
        );

        info!(
            source = %source.id(),
            workers = pool.size(),
            overdraw = config.overdraw_factor,
            "Map viewer started"
        );

        Ok(Self {
            source,
            view,
            frame_buffer_controller,
            redraw_controller,
            repaint_controller,
            layers,
            queue,
            pool,
        })
    }

    /// Submits a tile job directly. Returns false if it is already pending
    /// or the viewer is shut down.
    pub fn submit_job(&self, job: Job) -> bool {
        self.pool.submit(job)
    }

    /// Observable view state; mutate it to pan, zoom or resize.
    pub fn view(&self) -> &Arc<ViewModel> {
        &self.view
    }

    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    pub fn frame_buffer(&self) -> &Arc<FrameBuffer> {
        self.frame_buffer_controller.frame_buffer()
    }

    pub fn frame_buffer_controller(&self) -> &Arc<FrameBufferController> {
        &self.frame_buffer_controller
    }

    pub fn layers(&self) -> &Arc<LayerManager> {
        &self.layers
    }

    /// Last completed frame, in buffer coordinates.
    pub fn current_frame(&self) -> Option<Arc<Bitmap>> {
        self.frame_buffer().current_frame()
    }

    /// Paints the current frame onto a view-sized canvas.
    pub fn draw(&self, canvas: &mut PixmapMut<'_>) {
        self.frame_buffer().draw(canvas);
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Waits until no job is queued or in flight and the last requested
    /// frame is rendered.
    ///
    /// Returns false on timeout or shutdown.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !self.queue.wait_idle(remaining) {
                return false;
            }
            // Rendering may have queued tiles that are still missing
            self.layers.flush();
            if self.queue.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
        }
    }

    /// Stops the workers and detaches the listeners. Idempotent.
    pub fn shutdown(&self) {
        if self.pool.is_shut_down() {
            return;
        }
        self.pool.shutdown();

        let frame_buffer_controller: Arc<dyn Observer> = self.frame_buffer_controller.clone();
        self.view.remove_observer_all(&frame_buffer_controller);
        self.view.remove_observer_all(&self.redraw_controller);
        let _ = self.view.position().remove_observer(&self.repaint_controller);

        let abandoned = self.queue.drain().len();
        info!(abandoned, "Map viewer stopped");
    }
}

impl Drop for MapViewer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for MapViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapViewer")
            .field("source", &self.source.id())
            .field("pool", &self.pool)
            .field("frame_buffer", self.frame_buffer())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTileCache;
    use crate::coord::{Dimension, MapPosition};
    use crate::error::{ConfigError, FetchError};
    use crate::source::TemplateSource;
    use crate::surface::NullSurface;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tiny_skia::{Color, Pixmap};

    /// Fetcher returning solid tiles without touching the network.
    struct SolidFetcher {
        calls: AtomicUsize,
    }

    impl TileFetcher for SolidFetcher {
        fn fetch(&self, _job: &Job, _source: &dyn TileSource) -> Result<Bitmap, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut tile = Pixmap::new(256, 256).unwrap();
            tile.fill(Color::from_rgba8(0, 0, 200, 255));
            Ok(tile)
        }
    }

    fn source(limit: usize) -> Arc<dyn TileSource> {
        Arc::new(
            TemplateSource::builder("tile.example.org", 443)
                .zoom_range(0, 18)
                .parallelism_limit(limit)
                .build()
                .unwrap(),
        )
    }

    fn viewer(limit: usize) -> (MapViewer, Arc<SolidFetcher>, Arc<MemoryTileCache>) {
        let fetcher = Arc::new(SolidFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(MemoryTileCache::new(256));
        let viewer = MapViewer::start_with_fetcher(
            ViewerConfig::default().with_overdraw_factor(1.0),
            source(limit),
            fetcher.clone(),
            cache.clone(),
            Arc::new(NullSurface),
        )
        .unwrap();
        (viewer, fetcher, cache)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = MapViewer::start_with_fetcher(
            ViewerConfig::default().with_overdraw_factor(0.5),
            source(2),
            Arc::new(SolidFetcher {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(MemoryTileCache::new(16)),
            Arc::new(NullSurface),
        );
        assert_eq!(
            result.unwrap_err(),
            ViewerError::Config(ConfigError::InvalidOverdrawFactor(0.5))
        );
    }

    #[test]
    fn test_pool_sized_from_source() {
        let (viewer, _, _) = viewer(20);
        assert_eq!(viewer.pool_size(), 8);
    }

    #[test]
    fn test_renders_fetched_tiles() {
        let (viewer, fetcher, cache) = viewer(4);
        viewer.view().position().set_position(MapPosition::new(0.0, 0.0, 1));
        viewer.view().dimension().set_dimension(Dimension::new(512, 512));

        assert!(viewer.wait_idle(Duration::from_secs(10)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        assert_eq!(cache.entry_count(), 4);

        let frame = viewer.current_frame().unwrap();
        assert_eq!(frame.pixel(10, 10).unwrap().blue(), 200);
        assert_eq!(frame.pixel(500, 500).unwrap().blue(), 200);

        let mut canvas = Pixmap::new(512, 512).unwrap();
        viewer.draw(&mut canvas.as_mut());
        assert_eq!(canvas.pixel(256, 256).unwrap().blue(), 200);
    }

    #[test]
    fn test_shutdown_detaches_and_rejects_jobs() {
        let (viewer, _, _) = viewer(2);
        viewer.shutdown();
        viewer.shutdown();

        let job = Job::new(
            crate::coord::TileCoord::new(0, 0, 0),
            viewer.source().id().clone(),
        );
        assert!(!viewer.submit_job(job));
        assert_eq!(viewer.view().position().observable().observer_count(), 0);
        assert_eq!(viewer.view().dimension().observable().observer_count(), 0);
    }
}
