//! Viewer construction settings.

use std::time::Duration;

use tiny_skia::Color;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::coord::MAX_ZOOM;
use crate::error::ConfigError;
use crate::fetch::{CONNECT_TIMEOUT, READ_TIMEOUT};
use crate::model::DEFAULT_OVERDRAW_FACTOR;

/// Settings of a [`super::MapViewer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Ratio of frame buffer size to view size.
    pub overdraw_factor: f64,

    /// Lowest zoom level the view can reach.
    pub zoom_min: u8,

    /// Highest zoom level the view can reach.
    pub zoom_max: u8,

    /// Tiles kept by the default in-memory cache.
    pub cache_capacity: u64,

    /// TCP connect timeout per tile request.
    pub connect_timeout: Duration,

    /// Timeout for reading one tile response.
    pub read_timeout: Duration,

    /// Colour frames are cleared to before layers draw.
    pub background: Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            overdraw_factor: DEFAULT_OVERDRAW_FACTOR,
            zoom_min: 0,
            zoom_max: MAX_ZOOM,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            background: Color::from_rgba8(0xf8, 0xf4, 0xf0, 0xff),
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overdraw_factor(mut self, overdraw_factor: f64) -> Self {
        self.overdraw_factor = overdraw_factor;
        self
    }

    pub fn with_zoom_range(mut self, zoom_min: u8, zoom_max: u8) -> Self {
        self.zoom_min = zoom_min;
        self.zoom_max = zoom_max;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Checks the settings the models would otherwise reject later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.overdraw_factor.is_finite() || self.overdraw_factor < 1.0 {
            return Err(ConfigError::InvalidOverdrawFactor(self.overdraw_factor));
        }
        if self.zoom_min > self.zoom_max || self.zoom_max > MAX_ZOOM {
            return Err(ConfigError::InvalidZoomBounds {
                min: self.zoom_min,
                max: self.zoom_max,
            });
        }
        Ok(())
    }
}
