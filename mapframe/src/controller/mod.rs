//! Listeners wiring the view models to the frame buffer, the renderer and
//! the host.
//!
//! ```text
//!                      ┌──► FrameBufferController ──► FrameBuffer (size, transform)
//! DimensionModel ──┐   │
//! FrameBufferModel ├───┼──► RedrawController ──────► RedrawSignal (render a frame)
//! PositionModel ───┘   │
//!        └─────────────┴──► RepaintController ─────► HostSurface (repaint)
//! ```
//!
//! The repaint controller only listens to the position model. No controller
//! mutates the model that notified it.

mod frame_buffer;
mod redraw;
mod repaint;

pub use frame_buffer::FrameBufferController;
pub use redraw::RedrawController;
pub use repaint::RepaintController;
