use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::coord::{Dimension, MapPosition, Projection};
use crate::fetch::Bitmap;
use crate::frame::FrameBuffer;
use crate::model::ViewModel;
use crate::observer::Observer;

/// Keeps the frame buffer's size and transform in line with the view.
///
/// Registered on every view model. On each notification it resizes the
/// buffer if the view size or overdraw factor changed, then recomputes the
/// transform from the buffer's anchor to the live position.
pub struct FrameBufferController {
    frame_buffer: Arc<FrameBuffer>,
    view: Weak<ViewModel>,
    projection: Arc<dyn Projection>,
    /// Last observed view size and overdraw factor.
    last: Mutex<Option<(Option<Dimension>, f64)>>,
    /// Serializes notifications and frame publication, so the transform is
    /// always fitted against the newest anchor and position.
    fitting: Mutex<()>,
}

impl FrameBufferController {
    pub fn new(
        frame_buffer: Arc<FrameBuffer>,
        view: &Arc<ViewModel>,
        projection: Arc<dyn Projection>,
    ) -> Self {
        Self {
            frame_buffer,
            view: Arc::downgrade(view),
            projection,
            last: Mutex::new(None),
            fitting: Mutex::new(()),
        }
    }

    pub fn frame_buffer(&self) -> &Arc<FrameBuffer> {
        &self.frame_buffer
    }

    /// Number of transform recomputations applied to the frame buffer.
    pub fn recompute_count(&self) -> u64 {
        self.frame_buffer.recompute_count()
    }

    /// Publishes a rendered frame.
    ///
    /// The swap itself places the frame for its own anchor. The transform is
    /// only recomputed if the view moved while the frame was being rendered.
    pub fn frame_finished(&self, bitmap: Bitmap, anchor: MapPosition) -> bool {
        let _fitting = self.fitting.lock();
        if !self.frame_buffer.frame_finished(bitmap, anchor) {
            return false;
        }
        if let Some(view) = self.view.upgrade() {
            if view.position().position() != anchor {
                self.adjust_matrix(&view);
            }
        }
        true
    }

    fn resize_if_changed(&self, view: &ViewModel) {
        let dimension = view.dimension().dimension();
        let overdraw = view.frame_buffer().overdraw_factor();

        let mut last = self.last.lock();
        if *last == Some((dimension, overdraw)) {
            return;
        }
        *last = Some((dimension, overdraw));
        drop(last);

        let buffer = dimension
            .filter(Dimension::is_positive)
            .map(|d| d.scaled(overdraw))
            .unwrap_or_default();
        self.frame_buffer.set_dimension(buffer);
    }

    /// Fits the transform to the live view. Without a frame yet, the buffer
    /// is only centred.
    fn adjust_matrix(&self, view: &ViewModel) {
        let Some(dimension) = view.dimension().dimension() else {
            return;
        };
        let position = view.position().position();
        let (diff_x, diff_y, scale) = match self.frame_buffer.anchor() {
            Some(anchor) => self.offset(anchor, position),
            None => (0.0, 0.0, 1.0),
        };

        trace!(diff_x, diff_y, scale, "Adjusting frame transform");
        self.frame_buffer.adjust_matrix(diff_x, diff_y, scale, dimension);
    }

    /// Pixel offset of `anchor` from `position` at the current zoom, and the
    /// zoom ratio between them.
    fn offset(&self, anchor: MapPosition, position: MapPosition) -> (f64, f64, f64) {
        let zoom = position.zoom;
        let diff_x = self.projection.pixel_x(anchor.longitude, zoom)
            - self.projection.pixel_x(position.longitude, zoom);
        let diff_y = self.projection.pixel_y(anchor.latitude, zoom)
            - self.projection.pixel_y(position.latitude, zoom);
        let scale = 2.0_f64.powi(zoom as i32 - anchor.zoom as i32);
        (diff_x, diff_y, scale)
    }
}

impl Observer for FrameBufferController {
    fn on_change(&self) {
        let Some(view) = self.view.upgrade() else {
            return;
        };
        let _fitting = self.fitting.lock();
        self.resize_if_changed(&view);
        self.adjust_matrix(&view);
    }
}
