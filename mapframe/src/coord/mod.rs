//! Coordinate types and Web Mercator projection.
//!
//! Provides the tile addressing used by sources and jobs, the view-side
//! geometry types ([`MapPosition`], [`Dimension`]), and the [`Projection`]
//! capability the frame pipeline uses to turn geographic positions into
//! pixel coordinates at a given zoom level.

mod types;

pub use types::{Dimension, MapPosition, TileCoord, MAX_LAT, MAX_ZOOM, MIN_LAT};

use std::f64::consts::PI;

/// Default edge length of a raster tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Pure projection from geographic coordinates to world pixel coordinates.
///
/// Implementations must be free of side effects: the frame transform math
/// calls them for both the recorded anchor and the live view on every
/// view mutation.
pub trait Projection: Send + Sync {
    /// Pixel X coordinate of `longitude` at `zoom`.
    fn pixel_x(&self, longitude: f64, zoom: u8) -> f64;

    /// Pixel Y coordinate of `latitude` at `zoom`.
    fn pixel_y(&self, latitude: f64, zoom: u8) -> f64;

    /// Longitude of the pixel X coordinate at `zoom`.
    fn longitude(&self, pixel_x: f64, zoom: u8) -> f64;

    /// Latitude of the pixel Y coordinate at `zoom`.
    fn latitude(&self, pixel_y: f64, zoom: u8) -> f64;

    /// Edge length of one tile in pixels.
    fn tile_size(&self) -> u32;

    /// Size of the whole world in pixels at `zoom`.
    fn map_size(&self, zoom: u8) -> f64 {
        self.tile_size() as f64 * 2.0_f64.powi(zoom as i32)
    }
}

/// Spherical Web Mercator projection (EPSG:3857), as used by slippy-map
/// tile servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebMercator {
    tile_size: u32,
}

impl WebMercator {
    /// Creates a projection for tiles of the given edge length.
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl Projection for WebMercator {
    fn pixel_x(&self, longitude: f64, zoom: u8) -> f64 {
        (longitude + 180.0) / 360.0 * self.map_size(zoom)
    }

    fn pixel_y(&self, latitude: f64, zoom: u8) -> f64 {
        let lat_rad = latitude.clamp(MIN_LAT, MAX_LAT) * PI / 180.0;
        (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * self.map_size(zoom)
    }

    fn longitude(&self, pixel_x: f64, zoom: u8) -> f64 {
        pixel_x / self.map_size(zoom) * 360.0 - 180.0
    }

    fn latitude(&self, pixel_y: f64, zoom: u8) -> f64 {
        let y = pixel_y / self.map_size(zoom);
        let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
        (lat_rad * 180.0 / PI).clamp(MIN_LAT, MAX_LAT)
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }
}

/// Pixel coordinate of the top-left corner of a canvas of `dimension`
/// centred on `position`, at the position's zoom level.
pub fn top_left_pixel(
    projection: &dyn Projection,
    position: &MapPosition,
    dimension: Dimension,
) -> (f64, f64) {
    let center_x = projection.pixel_x(position.longitude, position.zoom);
    let center_y = projection.pixel_y(position.latitude, position.zoom);
    (
        center_x - dimension.width as f64 / 2.0,
        center_y - dimension.height as f64 / 2.0,
    )
}

/// Returns the tiles covering a canvas of `dimension` centred on `position`.
///
/// Tiles are yielded in row-major order and clamped to the valid tile
/// range of the zoom level. An empty vector is returned for a canvas
/// without positive size.
pub fn tiles_in_view(
    projection: &dyn Projection,
    position: &MapPosition,
    dimension: Dimension,
) -> Vec<TileCoord> {
    if !dimension.is_positive() {
        return Vec::new();
    }

    let tile_size = projection.tile_size() as f64;
    let (left, top) = top_left_pixel(projection, position, dimension);
    let right = left + dimension.width as f64 - 1.0;
    let bottom = top + dimension.height as f64 - 1.0;

    let max_index = (1_i64 << position.zoom) - 1;
    let clamp = |v: f64| ((v / tile_size).floor() as i64).clamp(0, max_index) as u32;

    let (x_min, x_max) = (clamp(left), clamp(right));
    let (y_min, y_max) = (clamp(top), clamp(bottom));

    let mut tiles = Vec::with_capacity(((x_max - x_min + 1) * (y_max - y_min + 1)) as usize);
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            tiles.push(TileCoord::new(x, y, position.zoom));
        }
    }
    tiles
}
