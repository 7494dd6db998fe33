//! Tile source contracts.
//!
//! A source describes a tile provider: how to turn a tile coordinate into a
//! URL, which zoom levels it serves and how many concurrent fetches it
//! tolerates. A source's identity is its host and port ([`SourceId`]).
//!
//! # Example
//!
//! ```
//! use mapframe::source::{TemplateSource, TileSource};
//! use mapframe::coord::TileCoord;
//!
//! let source = TemplateSource::builder("tile.example.org", 443)
//!     .template("/{z}/{x}/{y}.png")
//!     .zoom_range(0, 18)
//!     .parallelism_limit(4)
//!     .build()
//!     .unwrap();
//!
//! let url = source.url_for(TileCoord::new(1, 2, 3)).unwrap();
//! assert_eq!(url, "https://tile.example.org/3/1/2.png");
//! ```

mod template;

pub use template::{TemplateSource, TemplateSourceBuilder, DEFAULT_TEMPLATE};

use std::fmt;

use crate::coord::TileCoord;
use crate::error::{ConfigError, FetchError};

/// Identity of a tile source: host plus port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId {
    host: String,
    port: u16,
}

impl SourceId {
    /// Validates and creates a source identity.
    ///
    /// The port is taken as a wide integer so that out-of-range values from
    /// configuration files are reported rather than silently truncated.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidHost`] if `host` is empty or whitespace
    /// - [`ConfigError::InvalidPort`] if `port` is outside 0..=65535
    pub fn new(host: impl Into<String>, port: i64) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidHost);
        }
        let port = u16::try_from(port).map_err(|_| ConfigError::InvalidPort(port))?;
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Contract of a tile provider.
///
/// Implementations are immutable for the life of the layer that owns them
/// and are shared between the render path and every worker thread.
pub trait TileSource: Send + Sync {
    /// Host/port identity of the source.
    fn id(&self) -> &SourceId;

    /// Lowest zoom level served.
    fn zoom_min(&self) -> u8;

    /// Highest zoom level served.
    fn zoom_max(&self) -> u8;

    /// Maximum number of concurrent fetches the provider tolerates.
    ///
    /// Always at least 1. The worker pool clamps it to its own hard cap.
    fn parallelism_limit(&self) -> usize;

    /// Builds the URL of `tile`.
    ///
    /// # Errors
    ///
    /// [`FetchError::UrlFormation`] when the tile cannot be addressed on this
    /// source. The error is fatal to the job only.
    fn url_for(&self, tile: TileCoord) -> Result<String, FetchError>;

    /// Human readable name for logs.
    fn name(&self) -> &str {
        self.id().host()
    }

    /// Returns true if the source serves `zoom`.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.zoom_min() && zoom <= self.zoom_max()
    }
}
