use std::sync::{Arc, Weak};

use crate::observer::Observer;
use crate::pool::RedrawSignal;

/// Requests a new frame whenever the view changes.
///
/// Holds the renderer weakly: the renderer owns the view models this
/// controller is registered on.
pub struct RedrawController {
    redraw: Weak<dyn RedrawSignal>,
}

impl RedrawController {
    pub fn new(redraw: &Arc<dyn RedrawSignal>) -> Self {
        Self {
            redraw: Arc::downgrade(redraw),
        }
    }
}

impl Observer for RedrawController {
    fn on_change(&self) {
        if let Some(redraw) = self.redraw.upgrade() {
            redraw.request_redraw();
        }
    }
}
