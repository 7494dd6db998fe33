//! Coordinate value types.

use std::fmt;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;
/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;
/// Highest zoom level the pipeline addresses.
pub const MAX_ZOOM: u8 = 22;

/// A raster tile address in the XYZ (slippy map) scheme.
///
/// - `x`: column, 0 to 2^zoom - 1, west to east
/// - `y`: row, 0 to 2^zoom - 1, north to south
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Returns true if `x` and `y` address a tile that exists at `zoom`.
    pub fn is_valid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let tiles = 1_u64 << self.zoom;
        (self.x as u64) < tiles && (self.y as u64) < tiles
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic centre and zoom level of a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPosition {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Integer zoom level.
    pub zoom: u8,
}

impl MapPosition {
    pub fn new(latitude: f64, longitude: f64, zoom: u8) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
        }
    }
}

impl Default for MapPosition {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0)
    }
}

impl fmt::Display for MapPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6}@ZL{}",
            self.latitude, self.longitude, self.zoom
        )
    }
}

/// Pixel size of a view or buffer.
///
/// Signed so that a host may report degenerate sizes (e.g. a collapsed
/// window) without the model rejecting them; consumers check
/// [`Dimension::is_positive`] before allocating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub width: i32,
    pub height: i32,
}

impl Dimension {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True if both sides are strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns this dimension multiplied by `factor`, rounded to the
    /// nearest pixel.
    pub fn scaled(&self, factor: f64) -> Dimension {
        Dimension {
            width: (self.width as f64 * factor).round() as i32,
            height: (self.height as f64 * factor).round() as i32,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
