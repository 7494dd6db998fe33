use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tiny_skia::Color;
use tracing::trace;

use super::{DrawContext, Layer};
use crate::controller::FrameBufferController;
use crate::coord::{top_left_pixel, Dimension, Projection};
use crate::model::ViewModel;
use crate::pool::RedrawSignal;
use crate::surface::HostSurface;

/// Renders frames from the registered layers.
///
/// Redraw requests are coalesced: a request sets a pending flag, and
/// whichever thread holds the render lock keeps rendering until no request
/// is pending. A request arriving during a render therefore never starts a
/// second concurrent render, and is never lost.
pub struct LayerManager {
    layers: RwLock<Vec<Arc<dyn Layer>>>,
    view: Arc<ViewModel>,
    controller: Arc<FrameBufferController>,
    projection: Arc<dyn Projection>,
    host: Arc<dyn HostSurface>,
    background: Color,
    pending: AtomicBool,
    render_lock: Mutex<()>,
    renders: AtomicU64,
}

impl LayerManager {
    pub fn new(
        view: Arc<ViewModel>,
        controller: Arc<FrameBufferController>,
        projection: Arc<dyn Projection>,
        host: Arc<dyn HostSurface>,
        background: Color,
    ) -> Self {
        Self {
            layers: RwLock::new(Vec::new()),
            view,
            controller,
            projection,
            host,
            background,
            pending: AtomicBool::new(false),
            render_lock: Mutex::new(()),
            renders: AtomicU64::new(0),
        }
    }

    /// Appends a layer on top of the existing ones.
    pub fn add_layer(&self, layer: Arc<dyn Layer>) {
        self.layers.write().push(layer);
    }

    pub fn layer_count(&self) -> usize {
        self.layers.read().len()
    }

    /// Number of completed render passes.
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }

    /// Blocks until no render is running or pending.
    pub fn flush(&self) {
        let _guard = self.render_lock.lock();
        while self.pending.swap(false, Ordering::SeqCst) {
            self.render();
        }
    }

    fn render(&self) {
        let Some(mut bitmap) = self.controller.frame_buffer().drawing_bitmap() else {
            return;
        };

        let position = self.view.position().position();
        let canvas_dimension = Dimension::new(bitmap.width() as i32, bitmap.height() as i32);
        let ctx = DrawContext {
            position,
            top_left: top_left_pixel(self.projection.as_ref(), &position, canvas_dimension),
            canvas_dimension,
        };

        bitmap.fill(self.background);
        {
            let layers = self.layers.read();
            let mut canvas = bitmap.as_mut();
            for layer in layers.iter() {
                layer.draw(&ctx, &mut canvas);
            }
        }

        let published = self.controller.frame_finished(bitmap, position);
        self.renders.fetch_add(1, Ordering::SeqCst);
        trace!(position = %position, published, "Frame rendered");

        if published {
            self.host.request_repaint();
        }
    }
}

impl RedrawSignal for LayerManager {
    fn request_redraw(&self) {
        self.pending.store(true, Ordering::SeqCst);
        loop {
            let Some(guard) = self.render_lock.try_lock() else {
                return;
            };
            while self.pending.swap(false, Ordering::SeqCst) {
                self.render();
            }
            drop(guard);

            // A request may have arrived between the last check and the unlock
            if !self.pending.load(Ordering::SeqCst) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{MapPosition, WebMercator};
    use crate::frame::FrameBuffer;
    use crate::surface::NullSurface;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;
    use tiny_skia::{Paint, PixmapMut, Rect, Transform};

    /// Layer filling a fixed rectangle and counting its draws.
    struct SquareLayer {
        draws: AtomicUsize,
        delay: Duration,
    }

    impl Layer for SquareLayer {
        fn draw(&self, _ctx: &DrawContext, canvas: &mut PixmapMut<'_>) {
            self.draws.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            let mut paint = Paint::default();
            paint.set_color_rgba8(0, 128, 0, 255);
            let rect = Rect::from_xywh(0.0, 0.0, 2.0, 2.0).unwrap();
            canvas.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    fn manager(delay: Duration) -> (Arc<ViewModel>, Arc<LayerManager>, Arc<SquareLayer>) {
        let view = Arc::new(ViewModel::new(1.0, 0, 18).unwrap());
        let projection: Arc<dyn Projection> = Arc::new(WebMercator::default());
        let controller = Arc::new(FrameBufferController::new(
            Arc::new(FrameBuffer::new()),
            &view,
            Arc::clone(&projection),
        ));
        view.add_observer_all(controller.clone()).unwrap();

        let manager = Arc::new(LayerManager::new(
            Arc::clone(&view),
            controller,
            projection,
            Arc::new(NullSurface),
            Color::WHITE,
        ));
        let layer = Arc::new(SquareLayer {
            draws: AtomicUsize::new(0),
            delay,
        });
        manager.add_layer(layer.clone());
        (view, manager, layer)
    }

    #[test]
    fn test_render_publishes_frame() {
        let (view, manager, layer) = manager(Duration::ZERO);
        view.position().set_position(MapPosition::new(1.0, 2.0, 3));
        view.dimension().set_dimension(Dimension::new(8, 8));

        manager.request_redraw();
        assert_eq!(manager.render_count(), 1);
        assert_eq!(layer.draws.load(Ordering::SeqCst), 1);

        let frame_buffer = manager.controller.frame_buffer();
        let frame = frame_buffer.current_frame().unwrap();
        assert_eq!(frame.pixel(0, 0).unwrap().green(), 128);
        assert_eq!(frame.pixel(5, 5).unwrap().red(), 255);
        assert_eq!(frame_buffer.anchor(), Some(view.position().position()));
    }

    #[test]
    fn test_unallocated_buffer_skips_render() {
        let (_view, manager, layer) = manager(Duration::ZERO);
        manager.request_redraw();
        assert_eq!(manager.render_count(), 0);
        assert_eq!(layer.draws.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_requests_during_render_coalesce() {
        let (view, manager, layer) = manager(Duration::ZERO);
        view.dimension().set_dimension(Dimension::new(4, 4));

        // Simulate a render in progress on another thread
        let guard = manager.render_lock.lock();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.request_redraw())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(manager.render_count(), 0);
        drop(guard);

        manager.flush();
        assert_eq!(manager.render_count(), 1);
        assert_eq!(layer.draws.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_requests_all_served() {
        let (view, manager, layer) = manager(Duration::from_millis(5));
        view.dimension().set_dimension(Dimension::new(4, 4));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.request_redraw())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        manager.flush();

        let renders = manager.render_count();
        assert!((1..=8).contains(&renders));
        assert_eq!(layer.draws.load(Ordering::SeqCst) as u64, renders);
    }
}
