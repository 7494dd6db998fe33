use parking_lot::Mutex;

use super::Model;
use crate::coord::{MapPosition, Projection, MAX_LAT, MAX_ZOOM, MIN_LAT};
use crate::error::ConfigError;
use crate::observer::Observable;

/// Centre and zoom level of the view, bounded by a zoom range.
#[derive(Debug)]
pub struct PositionModel {
    position: Mutex<MapPosition>,
    zoom_min: u8,
    zoom_max: u8,
    observable: Observable,
}

impl PositionModel {
    /// Creates a model centred on 0,0 at `zoom_min`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidZoomBounds`] if `zoom_min > zoom_max` or
    /// `zoom_max` exceeds [`MAX_ZOOM`].
    pub fn new(zoom_min: u8, zoom_max: u8) -> Result<Self, ConfigError> {
        if zoom_min > zoom_max || zoom_max > MAX_ZOOM {
            return Err(ConfigError::InvalidZoomBounds {
                min: zoom_min,
                max: zoom_max,
            });
        }
        Ok(Self {
            position: Mutex::new(MapPosition::new(0.0, 0.0, zoom_min)),
            zoom_min,
            zoom_max,
            observable: Observable::new(),
        })
    }

    pub fn position(&self) -> MapPosition {
        *self.position.lock()
    }

    pub fn zoom_min(&self) -> u8 {
        self.zoom_min
    }

    pub fn zoom_max(&self) -> u8 {
        self.zoom_max
    }

    fn clamp_zoom(&self, zoom: u8) -> u8 {
        zoom.clamp(self.zoom_min, self.zoom_max)
    }

    fn update(&self, f: impl FnOnce(&mut MapPosition)) {
        {
            let mut position = self.position.lock();
            f(&mut position);
            position.latitude = position.latitude.clamp(MIN_LAT, MAX_LAT);
            position.longitude = position.longitude.clamp(-180.0, 180.0);
            position.zoom = self.clamp_zoom(position.zoom);
        }
        self.observable.notify_observers();
    }

    /// Moves the centre, keeping the zoom level.
    pub fn set_center(&self, latitude: f64, longitude: f64) {
        self.update(|p| {
            p.latitude = latitude;
            p.longitude = longitude;
        });
    }

    /// Sets the zoom level, clamped to the model's bounds.
    pub fn set_zoom(&self, zoom: u8) {
        self.update(|p| p.zoom = zoom);
    }

    /// Sets centre and zoom in a single batch.
    pub fn set_position(&self, position: MapPosition) {
        self.update(|p| *p = position);
    }

    pub fn zoom_in(&self) {
        self.update(|p| p.zoom = p.zoom.saturating_add(1));
    }

    pub fn zoom_out(&self) {
        self.update(|p| p.zoom = p.zoom.saturating_sub(1));
    }

    /// Pans the centre by a pixel offset at the current zoom level.
    pub fn move_center(&self, dx: f64, dy: f64, projection: &dyn Projection) {
        self.update(|p| {
            let x = projection.pixel_x(p.longitude, p.zoom) + dx;
            let y = projection.pixel_y(p.latitude, p.zoom) + dy;
            p.longitude = projection.longitude(x, p.zoom);
            p.latitude = projection.latitude(y, p.zoom);
        });
    }
}

impl Model for PositionModel {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::WebMercator;
    use crate::observer::tests::CountingObserver;
    use std::sync::Arc;

    fn model() -> (PositionModel, Arc<CountingObserver>) {
        let model = PositionModel::new(2, 10).unwrap();
        let counting = Arc::new(CountingObserver::default());
        model.add_observer(counting.clone()).unwrap();
        (model, counting)
    }

    #[test]
    fn test_initial_position() {
        let (model, _) = model();
        assert_eq!(model.position(), MapPosition::new(0.0, 0.0, 2));
    }

    #[test]
    fn test_zoom_bounds_validated() {
        assert!(PositionModel::new(5, 4).is_err());
        assert!(PositionModel::new(0, MAX_ZOOM + 1).is_err());
        assert!(PositionModel::new(0, MAX_ZOOM).is_ok());
    }

    #[test]
    fn test_set_zoom_clamped() {
        let (model, counting) = model();
        model.set_zoom(15);
        assert_eq!(model.position().zoom, 10);
        model.set_zoom(0);
        assert_eq!(model.position().zoom, 2);
        assert_eq!(counting.count(), 2);
    }

    #[test]
    fn test_zoom_in_out_stop_at_bounds() {
        let (model, _) = model();
        model.zoom_out();
        assert_eq!(model.position().zoom, 2);
        for _ in 0..20 {
            model.zoom_in();
        }
        assert_eq!(model.position().zoom, 10);
    }

    #[test]
    fn test_set_position_is_one_batch() {
        let (model, counting) = model();
        model.set_position(MapPosition::new(48.1, 11.5, 7));
        assert_eq!(model.position(), MapPosition::new(48.1, 11.5, 7));
        assert_eq!(counting.count(), 1);
    }

    #[test]
    fn test_set_center_clamps_latitude() {
        let (model, _) = model();
        model.set_center(89.0, 200.0);
        let position = model.position();
        assert_eq!(position.latitude, MAX_LAT);
        assert_eq!(position.longitude, 180.0);
    }

    #[test]
    fn test_move_center_by_pixels() {
        let (model, counting) = model();
        let projection = WebMercator::default();
        model.set_zoom(4);

        // One full map width at zoom 4 is 4096 px, so 1024 px is 90 degrees
        model.move_center(1024.0, 0.0, &projection);
        let position = model.position();
        assert!((position.longitude - 90.0).abs() < 1e-9);
        assert!(position.latitude.abs() < 1e-9);
        assert_eq!(counting.count(), 2);
    }
}
