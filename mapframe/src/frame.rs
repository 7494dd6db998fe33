//! Double-buffered frame with an affine transform.
//!
//! The buffer owns two bitmaps of the same (over-drawn) size:
//!
//! ```text
//!            drawing_bitmap()              frame_finished()
//! standby ───────────────────► renderer ───────────────────► active
//!    ▲                                                          │
//!    └──────────────── previous active (if unshared) ◄──────────┘
//! ```
//!
//! The active bitmap is shared with readers as an `Arc`; the standby one is
//! exclusively owned, so a frame being rendered is never visible to `draw`.
//! The active bitmap was rendered for an anchor position; the transform
//! maps it onto the live view until the next frame replaces it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapMut, PixmapPaint, Transform};
use tracing::{debug, warn};

use crate::coord::{Dimension, MapPosition};
use crate::fetch::Bitmap;

struct FrameState {
    /// Last completed frame, `None` until something was rendered.
    active: Option<Arc<Bitmap>>,
    /// Bitmap handed to the renderer next.
    standby: Option<Bitmap>,
    /// Allocated size, `None` while unallocated.
    dimension: Option<Dimension>,
    transform: Transform,
    /// Position the active frame was rendered for.
    anchor: Option<MapPosition>,
    /// View size the transform was last fitted to.
    view_dimension: Option<Dimension>,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            active: None,
            standby: None,
            dimension: None,
            transform: Transform::identity(),
            anchor: None,
            view_dimension: None,
        }
    }
}

fn allocate(dimension: Dimension) -> Option<Bitmap> {
    if !dimension.is_positive() {
        return None;
    }
    Pixmap::new(dimension.width as u32, dimension.height as u32)
}

fn bitmap_dimension(bitmap: &Bitmap) -> Dimension {
    Dimension::new(bitmap.width() as i32, bitmap.height() as i32)
}

/// Transform placing a `buffer` sized frame on a `view` sized canvas, given
/// the anchor's pixel offset from the live centre and the zoom ratio.
fn fit_transform(
    buffer: Dimension,
    view: Dimension,
    diff_x: f64,
    diff_y: f64,
    scale_factor: f64,
) -> Transform {
    let buffer_width = buffer.width as f32;
    let buffer_height = buffer.height as f32;
    let scale = scale_factor as f32;

    let mut transform = Transform::identity().pre_translate(
        (buffer_width - view.width as f32) / -2.0,
        (buffer_height - view.height as f32) / -2.0,
    );

    if scale_factor != 1.0 {
        transform = transform
            .pre_translate(
                buffer_width / -2.0 * (scale - 1.0),
                buffer_height / -2.0 * (scale - 1.0),
            )
            .pre_scale(scale, scale);
    }

    transform.pre_translate(diff_x as f32, diff_y as f32)
}

/// Double-buffered frame shared by the renderer and the host surface.
#[derive(Default)]
pub struct FrameBuffer {
    state: Mutex<FrameState>,
    recomputes: AtomicU64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes the buffer.
    ///
    /// Does nothing if `dimension` equals the current size. A positive
    /// dimension reallocates both bitmaps as transparent; any other value
    /// unallocates them. The previous frame and its anchor are discarded
    /// either way.
    pub fn set_dimension(&self, dimension: Dimension) {
        let mut state = self.state.lock();
        let target = dimension.is_positive().then_some(dimension);
        if state.dimension == target {
            return;
        }

        state.active = None;
        state.anchor = None;
        state.transform = Transform::identity();
        state.standby = target.and_then(allocate);

        if target.is_some() && state.standby.is_none() {
            warn!(dimension = %dimension, "Frame buffer allocation failed");
            state.dimension = None;
            return;
        }

        state.dimension = target;
        debug!(dimension = %dimension, allocated = target.is_some(), "Frame buffer resized");
    }

    /// Rebuilds the transform mapping the active frame onto the view.
    ///
    /// `diff_x`/`diff_y` is the pixel offset of the anchor from the live
    /// centre and `scale_factor` the zoom ratio between them. The overdrawn
    /// buffer is centred on a view of `view_dimension` first.
    pub fn adjust_matrix(
        &self,
        diff_x: f64,
        diff_y: f64,
        scale_factor: f64,
        view_dimension: Dimension,
    ) {
        let mut state = self.state.lock();
        let Some(buffer) = state.dimension else {
            return;
        };

        state.transform = fit_transform(buffer, view_dimension, diff_x, diff_y, scale_factor);
        state.view_dimension = Some(view_dimension);
        self.recomputes.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of transform recomputations done by [`Self::adjust_matrix`].
    pub fn recompute_count(&self) -> u64 {
        self.recomputes.load(Ordering::SeqCst)
    }

    /// Draws the active frame onto `canvas` with the current transform.
    ///
    /// No-op while unallocated or before the first frame completes.
    pub fn draw(&self, canvas: &mut PixmapMut<'_>) {
        let (active, transform) = {
            let state = self.state.lock();
            match (&state.active, state.dimension) {
                (Some(active), Some(_)) => (Arc::clone(active), state.transform),
                _ => return,
            }
        };

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        canvas.draw_pixmap(0, 0, Pixmap::as_ref(&active), &paint, transform, None);
    }

    /// Hands the standby bitmap to the renderer, cleared to transparent.
    ///
    /// Returns `None` while unallocated or while the standby bitmap is
    /// already out with a renderer.
    pub fn drawing_bitmap(&self) -> Option<Bitmap> {
        let mut bitmap = self.state.lock().standby.take()?;
        bitmap.fill(Color::TRANSPARENT);
        Some(bitmap)
    }

    /// Publishes a rendered bitmap as the active frame.
    ///
    /// The previous active bitmap becomes the standby one if no reader still
    /// holds it, otherwise a fresh standby is allocated. A bitmap whose size
    /// no longer matches the buffer is discarded and `false` returned.
    ///
    /// The transform is reset in the same step to place the new frame as
    /// seen from its own anchor, centred on the last fitted view size, so
    /// `draw` never pairs a frame with another frame's transform.
    pub fn frame_finished(&self, bitmap: Bitmap, anchor: MapPosition) -> bool {
        let mut state = self.state.lock();
        let Some(dimension) = state.dimension else {
            debug!("Discarding frame rendered for an unallocated buffer");
            return false;
        };
        if bitmap_dimension(&bitmap) != dimension {
            debug!(
                frame = %bitmap_dimension(&bitmap),
                buffer = %dimension,
                "Discarding frame rendered before a resize"
            );
            return false;
        }

        let previous = state.active.replace(Arc::new(bitmap));
        let reclaimed = previous.and_then(|active| Arc::try_unwrap(active).ok());
        state.standby = reclaimed.or_else(|| allocate(dimension));
        state.anchor = Some(anchor);
        let view = state.view_dimension.unwrap_or(dimension);
        state.transform = fit_transform(dimension, view, 0.0, 0.0, 1.0);
        true
    }

    /// Last completed frame.
    pub fn current_frame(&self) -> Option<Arc<Bitmap>> {
        self.state.lock().active.clone()
    }

    pub fn transform(&self) -> Transform {
        self.state.lock().transform
    }

    /// Allocated size, `None` while unallocated.
    pub fn dimension(&self) -> Option<Dimension> {
        self.state.lock().dimension
    }

    /// Position the current frame was rendered for.
    pub fn anchor(&self) -> Option<MapPosition> {
        self.state.lock().anchor
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FrameBuffer")
            .field("dimension", &state.dimension)
            .field("rendered", &state.active.is_some())
            .field("anchor", &state.anchor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(dimension: Dimension, color: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(dimension.width as u32, dimension.height as u32).unwrap();
        pixmap.fill(color);
        pixmap
    }

    fn red() -> Color {
        Color::from_rgba8(255, 0, 0, 255)
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let p = pixmap.pixel(x, y).unwrap();
        (p.red(), p.green(), p.blue(), p.alpha())
    }

    #[test]
    fn test_adjust_matrix_identity() {
        let buffer = FrameBuffer::new();
        let dimension = Dimension::new(800, 600);
        buffer.set_dimension(dimension);

        buffer.adjust_matrix(0.0, 0.0, 1.0, dimension);
        assert!(buffer.transform().is_identity());
    }

    #[test]
    fn test_adjust_matrix_centres_overdrawn_buffer() {
        let buffer = FrameBuffer::new();
        buffer.set_dimension(Dimension::new(1200, 900));

        buffer.adjust_matrix(0.0, 0.0, 1.0, Dimension::new(800, 600));
        let t = buffer.transform();
        assert_eq!((t.tx, t.ty), (-200.0, -150.0));
        assert_eq!((t.sx, t.sy), (1.0, 1.0));
    }

    #[test]
    fn test_adjust_matrix_translation_and_scale() {
        let buffer = FrameBuffer::new();
        let dimension = Dimension::new(100, 100);
        buffer.set_dimension(dimension);

        buffer.adjust_matrix(10.0, -5.0, 2.0, dimension);
        let t = buffer.transform();
        // translate(-50, -50) * scale(2) * translate(10, -5)
        assert_eq!((t.sx, t.sy), (2.0, 2.0));
        assert_eq!(t.tx, -50.0 + 20.0);
        assert_eq!(t.ty, -50.0 - 10.0);
    }

    #[test]
    fn test_adjust_matrix_without_dimension_is_noop() {
        let buffer = FrameBuffer::new();
        buffer.adjust_matrix(10.0, 10.0, 2.0, Dimension::new(10, 10));
        assert!(buffer.transform().is_identity());
    }

    #[test]
    fn test_non_positive_dimension_unallocates() {
        let buffer = FrameBuffer::new();
        buffer.set_dimension(Dimension::new(10, 10));
        buffer.set_dimension(Dimension::new(0, 10));

        assert_eq!(buffer.dimension(), None);
        assert!(buffer.drawing_bitmap().is_none());
        assert!(buffer.current_frame().is_none());
    }

    #[test]
    fn test_draw_unallocated_is_noop() {
        let buffer = FrameBuffer::new();
        buffer.set_dimension(Dimension::new(-1, 5));

        let mut canvas = filled(Dimension::new(4, 4), red());
        buffer.draw(&mut canvas.as_mut());
        assert_eq!(pixel(&canvas, 0, 0), (255, 0, 0, 255));
    }

    #[test]
    fn test_frame_finished_swaps_buffers() {
        let buffer = FrameBuffer::new();
        let dimension = Dimension::new(8, 8);
        buffer.set_dimension(dimension);

        let mut bitmap = buffer.drawing_bitmap().unwrap();
        bitmap.fill(red());
        let anchor = MapPosition::new(1.0, 2.0, 3);
        assert!(buffer.frame_finished(bitmap, anchor));

        let frame = buffer.current_frame().unwrap();
        assert_eq!(pixel(&frame, 3, 3), (255, 0, 0, 255));
        assert_eq!(buffer.anchor(), Some(anchor));

        // Standby is available again and cleared
        let next = buffer.drawing_bitmap().unwrap();
        assert_eq!(pixel(&next, 3, 3), (0, 0, 0, 0));
    }

    #[test]
    fn test_reader_keeps_old_frame_across_swap() {
        let buffer = FrameBuffer::new();
        let dimension = Dimension::new(4, 4);
        buffer.set_dimension(dimension);

        let mut first = buffer.drawing_bitmap().unwrap();
        first.fill(red());
        buffer.frame_finished(first, MapPosition::default());
        let held = buffer.current_frame().unwrap();

        let mut second = buffer.drawing_bitmap().unwrap();
        second.fill(Color::from_rgba8(0, 255, 0, 255));
        buffer.frame_finished(second, MapPosition::default());

        // Held frame is untouched, the new standby was freshly allocated
        assert_eq!(pixel(&held, 0, 0), (255, 0, 0, 255));
        let standby = buffer.drawing_bitmap().unwrap();
        assert!(!std::ptr::eq(standby.data().as_ptr(), held.data().as_ptr()));
        assert_eq!(pixel(&buffer.current_frame().unwrap(), 0, 0), (0, 255, 0, 255));
    }

    #[test]
    fn test_frame_from_before_resize_is_discarded() {
        let buffer = FrameBuffer::new();
        buffer.set_dimension(Dimension::new(4, 4));
        let stale = buffer.drawing_bitmap().unwrap();

        buffer.set_dimension(Dimension::new(6, 6));
        assert!(!buffer.frame_finished(stale, MapPosition::default()));
        assert!(buffer.current_frame().is_none());
        assert!(buffer.drawing_bitmap().is_some());
    }

    #[test]
    fn test_draw_applies_transform() {
        let buffer = FrameBuffer::new();
        let dimension = Dimension::new(4, 4);
        buffer.set_dimension(dimension);

        let mut bitmap = buffer.drawing_bitmap().unwrap();
        bitmap.fill(red());
        buffer.frame_finished(bitmap, MapPosition::default());
        buffer.adjust_matrix(2.0, 0.0, 1.0, dimension);

        let mut canvas = Pixmap::new(4, 4).unwrap();
        buffer.draw(&mut canvas.as_mut());
        assert_eq!(pixel(&canvas, 0, 0).3, 0);
        assert_eq!(pixel(&canvas, 3, 0), (255, 0, 0, 255));
    }

    #[test]
    fn test_same_dimension_keeps_frame() {
        let buffer = FrameBuffer::new();
        let dimension = Dimension::new(4, 4);
        buffer.set_dimension(dimension);
        let bitmap = buffer.drawing_bitmap().unwrap();
        buffer.frame_finished(bitmap, MapPosition::default());

        buffer.set_dimension(dimension);
        assert!(buffer.current_frame().is_some());
    }

    #[test]
    fn test_frame_finished_resets_transform_for_new_anchor() {
        let buffer = FrameBuffer::new();
        buffer.set_dimension(Dimension::new(1200, 900));
        let view = Dimension::new(800, 600);
        buffer.adjust_matrix(0.0, 0.0, 1.0, view);

        let bitmap = buffer.drawing_bitmap().unwrap();
        buffer.frame_finished(bitmap, MapPosition::new(10.0, 10.0, 5));
        // The view moved and zoomed before the next frame completed
        buffer.adjust_matrix(40.0, -20.0, 2.0, view);

        let bitmap = buffer.drawing_bitmap().unwrap();
        assert!(buffer.frame_finished(bitmap, MapPosition::new(12.0, 10.0, 6)));
        let t = buffer.transform();
        assert_eq!((t.sx, t.sy), (1.0, 1.0));
        assert_eq!((t.tx, t.ty), (-200.0, -150.0));
        assert_eq!(buffer.anchor(), Some(MapPosition::new(12.0, 10.0, 6)));
    }

    #[test]
    fn test_recompute_count_tracks_adjustments() {
        let buffer = FrameBuffer::new();
        buffer.adjust_matrix(0.0, 0.0, 1.0, Dimension::new(10, 10));
        assert_eq!(buffer.recompute_count(), 0);

        let dimension = Dimension::new(10, 10);
        buffer.set_dimension(dimension);
        buffer.adjust_matrix(0.0, 0.0, 1.0, dimension);
        let bitmap = buffer.drawing_bitmap().unwrap();
        buffer.frame_finished(bitmap, MapPosition::default());
        assert_eq!(buffer.recompute_count(), 1);
    }
}
