use thiserror::Error;

use crate::error::ConfigError;
use crate::observer::ObserverError;

/// Failure to assemble a [`super::MapViewer`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error("Invalid viewer configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to wire view listeners: {0}")]
    Observer(#[from] ObserverError),
}
