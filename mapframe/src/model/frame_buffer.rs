use parking_lot::Mutex;

use super::Model;
use crate::error::ConfigError;
use crate::observer::Observable;

/// Default ratio of buffer size to view size.
pub const DEFAULT_OVERDRAW_FACTOR: f64 = 1.2;

fn validate(overdraw_factor: f64) -> Result<f64, ConfigError> {
    if overdraw_factor.is_finite() && overdraw_factor >= 1.0 {
        Ok(overdraw_factor)
    } else {
        Err(ConfigError::InvalidOverdrawFactor(overdraw_factor))
    }
}

/// Frame buffer settings.
///
/// The overdraw factor makes the buffer larger than the view so that a pan
/// reveals already rendered content instead of empty space.
#[derive(Debug)]
pub struct FrameBufferModel {
    overdraw_factor: Mutex<f64>,
    observable: Observable,
}

impl FrameBufferModel {
    pub fn new() -> Self {
        Self {
            overdraw_factor: Mutex::new(DEFAULT_OVERDRAW_FACTOR),
            observable: Observable::new(),
        }
    }

    /// # Errors
    ///
    /// [`ConfigError::InvalidOverdrawFactor`] if the factor is below 1.0 or
    /// not finite.
    pub fn with_overdraw_factor(overdraw_factor: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            overdraw_factor: Mutex::new(validate(overdraw_factor)?),
            observable: Observable::new(),
        })
    }

    pub fn overdraw_factor(&self) -> f64 {
        *self.overdraw_factor.lock()
    }

    /// Changes the overdraw factor. Listeners are not notified on error.
    pub fn set_overdraw_factor(&self, overdraw_factor: f64) -> Result<(), ConfigError> {
        let overdraw_factor = validate(overdraw_factor)?;
        *self.overdraw_factor.lock() = overdraw_factor;
        self.observable.notify_observers();
        Ok(())
    }
}

impl Default for FrameBufferModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for FrameBufferModel {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}
