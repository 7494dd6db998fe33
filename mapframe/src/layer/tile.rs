use std::sync::Arc;

use tiny_skia::{Pixmap, PixmapMut, PixmapPaint, Transform};
use tracing::trace;

use super::{DrawContext, Layer};
use crate::cache::TileCache;
use crate::coord::{tiles_in_view, Projection};
use crate::job::Job;
use crate::queue::JobQueue;
use crate::source::TileSource;

/// Raster tiles of one source.
///
/// Draws the cached tiles covering the canvas and submits a job for each
/// missing one. The worker pool fetches it and requests another frame.
pub struct TileLayer {
    source: Arc<dyn TileSource>,
    cache: Arc<dyn TileCache>,
    queue: Arc<JobQueue>,
    projection: Arc<dyn Projection>,
}

impl TileLayer {
    pub fn new(
        source: Arc<dyn TileSource>,
        cache: Arc<dyn TileCache>,
        queue: Arc<JobQueue>,
        projection: Arc<dyn Projection>,
    ) -> Self {
        Self {
            source,
            cache,
            queue,
            projection,
        }
    }

    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }
}

impl Layer for TileLayer {
    fn draw(&self, ctx: &DrawContext, canvas: &mut PixmapMut<'_>) {
        let zoom = ctx.position.zoom;
        if !self.source.supports_zoom(zoom) {
            trace!(zoom, source = self.source.name(), "Zoom level not served");
            return;
        }

        let tile_size = self.projection.tile_size() as f64;
        let paint = PixmapPaint::default();
        let mut missing = 0usize;

        for tile in tiles_in_view(self.projection.as_ref(), &ctx.position, ctx.canvas_dimension) {
            let job = Job::new(tile, self.source.id().clone());
            match self.cache.get(&job) {
                Some(bitmap) => {
                    let x = (tile.x as f64 * tile_size - ctx.top_left.0).round() as i32;
                    let y = (tile.y as f64 * tile_size - ctx.top_left.1).round() as i32;
                    canvas.draw_pixmap(
                        x,
                        y,
                        Pixmap::as_ref(&bitmap),
                        &paint,
                        Transform::identity(),
                        None,
                    );
                }
                None => {
                    missing += 1;
                    self.queue.push(job);
                }
            }
        }

        if missing > 0 {
            trace!(missing, zoom, "Submitted missing tiles");
        }
    }

    fn name(&self) -> &str {
        self.source.name()
    }
}
