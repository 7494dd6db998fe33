//! Error taxonomy of the tile pipeline.
//!
//! Two families exist:
//!
//! - [`ConfigError`] is raised while building sources, models or the viewer.
//!   It is fatal and aborts setup; nothing falls back to a default.
//! - [`FetchError`] is raised for a single job. Workers log it and drop the
//!   job; it never reaches the caller that submitted the job.

use thiserror::Error;

/// Invalid configuration detected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Source host is empty.
    #[error("Invalid source host: host must not be empty")]
    InvalidHost,

    /// Source port outside 0..=65535.
    #[error("Invalid source port {0}: must be within 0..=65535")]
    InvalidPort(i64),

    /// Zoom bounds are inverted or exceed the supported maximum.
    #[error("Invalid zoom bounds {min}..={max}")]
    InvalidZoomBounds { min: u8, max: u8 },

    /// Parallelism limit of zero.
    #[error("Invalid parallelism limit {0}: must be at least 1")]
    InvalidParallelism(usize),

    /// URL template lacks a required placeholder.
    #[error("Invalid URL template '{template}': missing {placeholder}")]
    InvalidTemplate {
        template: String,
        placeholder: &'static str,
    },

    /// Overdraw factor below 1.0 or not finite.
    #[error("Invalid overdraw factor {0}: must be finite and at least 1.0")]
    InvalidOverdrawFactor(f64),

    /// HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// Failure of a single tile job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The job's coordinate cannot be turned into a URL for its source.
    #[error("Cannot form URL for {tile}: {reason}")]
    UrlFormation { tile: String, reason: String },

    /// Connect/read timeout, non-success status or I/O failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed tile payload.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::UrlFormation { .. } => "url",
            FetchError::Network(_) => "network",
            FetchError::Decode(_) => "decode",
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}
