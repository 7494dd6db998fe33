//! Observable view state.
//!
//! The view is split into three independently owned models:
//!
//! | Model                | State                           |
//! |----------------------|---------------------------------|
//! | [`DimensionModel`]   | Pixel size of the view          |
//! | [`FrameBufferModel`] | Overdraw factor of the buffer   |
//! | [`PositionModel`]    | Centre, zoom and zoom bounds    |
//!
//! Every mutating call is one batch: the model updates its state under its
//! own lock, releases it, then notifies its listeners exactly once.

mod dimension;
mod frame_buffer;
mod position;

pub use dimension::DimensionModel;
pub use frame_buffer::{FrameBufferModel, DEFAULT_OVERDRAW_FACTOR};
pub use position::PositionModel;

use std::sync::Arc;

use crate::error::ConfigError;
use crate::observer::{Observable, Observer, ObserverError};

/// A model that notifies listeners of its changes.
pub trait Model {
    fn observable(&self) -> &Observable;

    fn add_observer(&self, observer: Arc<dyn Observer>) -> Result<(), ObserverError> {
        self.observable().add_observer(observer)
    }

    fn remove_observer(&self, observer: &Arc<dyn Observer>) -> Result<(), ObserverError> {
        self.observable().remove_observer(observer)
    }
}

/// Aggregate of the three view models.
#[derive(Debug)]
pub struct ViewModel {
    dimension: DimensionModel,
    frame_buffer: FrameBufferModel,
    position: PositionModel,
}

impl ViewModel {
    /// Creates a view with no dimension, centred on 0,0 at `zoom_min`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid overdraw factor or zoom bounds.
    pub fn new(overdraw_factor: f64, zoom_min: u8, zoom_max: u8) -> Result<Self, ConfigError> {
        Ok(Self {
            dimension: DimensionModel::new(),
            frame_buffer: FrameBufferModel::with_overdraw_factor(overdraw_factor)?,
            position: PositionModel::new(zoom_min, zoom_max)?,
        })
    }

    pub fn dimension(&self) -> &DimensionModel {
        &self.dimension
    }

    pub fn frame_buffer(&self) -> &FrameBufferModel {
        &self.frame_buffer
    }

    pub fn position(&self) -> &PositionModel {
        &self.position
    }

    /// Registers `observer` on all three models.
    ///
    /// Stops at the first model that rejects it.
    pub fn add_observer_all(&self, observer: Arc<dyn Observer>) -> Result<(), ObserverError> {
        self.dimension.add_observer(Arc::clone(&observer))?;
        self.frame_buffer.add_observer(Arc::clone(&observer))?;
        self.position.add_observer(observer)
    }

    /// Unregisters `observer` from every model it is registered on.
    pub fn remove_observer_all(&self, observer: &Arc<dyn Observer>) {
        let _ = self.dimension.remove_observer(observer);
        let _ = self.frame_buffer.remove_observer(observer);
        let _ = self.position.remove_observer(observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Dimension;
    use crate::observer::tests::CountingObserver;

    #[test]
    fn test_new_validates() {
        assert!(ViewModel::new(1.2, 0, 18).is_ok());
        assert_eq!(
            ViewModel::new(0.5, 0, 18).unwrap_err(),
            ConfigError::InvalidOverdrawFactor(0.5)
        );
        assert!(matches!(
            ViewModel::new(1.0, 10, 2),
            Err(ConfigError::InvalidZoomBounds { .. })
        ));
    }

    #[test]
    fn test_observer_on_all_models() {
        let view = ViewModel::new(1.0, 0, 18).unwrap();
        let counting = Arc::new(CountingObserver::default());
        view.add_observer_all(counting.clone()).unwrap();

        view.dimension().set_dimension(Dimension::new(10, 10));
        view.frame_buffer().set_overdraw_factor(1.5).unwrap();
        view.position().set_zoom(3);
        assert_eq!(counting.count(), 3);

        let observer: Arc<dyn Observer> = counting.clone();
        view.remove_observer_all(&observer);
        view.position().set_zoom(4);
        assert_eq!(counting.count(), 3);
    }
}
