//! Layers drawn into the frame buffer.
//!
//! A render pass hands every layer the same [`DrawContext`]: the position
//! the frame is rendered for and the pixel coordinate of the canvas's top
//! left corner at that position's zoom level.

mod manager;
mod tile;

pub use manager::LayerManager;
pub use tile::TileLayer;

use tiny_skia::PixmapMut;

use crate::coord::{Dimension, MapPosition};

/// Parameters of one render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    /// Position the frame is rendered for.
    pub position: MapPosition,
    /// World pixel coordinate of the canvas origin.
    pub top_left: (f64, f64),
    pub canvas_dimension: Dimension,
}

/// Something drawn into a frame.
pub trait Layer: Send + Sync {
    fn draw(&self, ctx: &DrawContext, canvas: &mut PixmapMut<'_>);

    fn name(&self) -> &str {
        "layer"
    }
}
