use std::sync::Arc;

use crate::observer::Observer;
use crate::surface::HostSurface;

/// Asks the host to repaint when the position changes, so the existing
/// frame is shown with its updated transform before the next frame is done.
pub struct RepaintController {
    host: Arc<dyn HostSurface>,
}

impl RepaintController {
    pub fn new(host: Arc<dyn HostSurface>) -> Self {
        Self { host }
    }
}

impl Observer for RepaintController {
    fn on_change(&self) {
        self.host.request_repaint();
    }
}
