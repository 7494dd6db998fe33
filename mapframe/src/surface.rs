//! Host surface capability.
//!
//! The host is whatever displays the frame buffer (a widget, a window, a
//! headless PNG writer). The pipeline only ever asks it to repaint; the host
//! then calls [`crate::frame::FrameBuffer::draw`] from its own thread.

/// Displays the frame buffer.
pub trait HostSurface: Send + Sync {
    /// Schedules a repaint. Must not block.
    fn request_repaint(&self);
}

impl<F> HostSurface for F
where
    F: Fn() + Send + Sync,
{
    fn request_repaint(&self) {
        self()
    }
}

/// Surface that ignores repaint requests, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl HostSurface for NullSurface {
    fn request_repaint(&self) {}
}
