//! URL-template tile source.
//!
//! Covers the common slippy-map layout where a tile lives at a path such as
//! `/{z}/{x}/{y}.png` on one host, optionally spread across subdomains
//! (`a.tile.example.org`, `b.tile.example.org`, ...).

use reqwest::Url;

use super::{SourceId, TileSource};
use crate::coord::{TileCoord, MAX_ZOOM};
use crate::error::{ConfigError, FetchError};

/// Default path template.
pub const DEFAULT_TEMPLATE: &str = "/{z}/{x}/{y}.png";

/// Tile source defined by a path template on a single host.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    id: SourceId,
    scheme: String,
    template: String,
    subdomains: Vec<String>,
    zoom_min: u8,
    zoom_max: u8,
    parallelism_limit: usize,
}

impl TemplateSource {
    /// Starts building a source for `host:port`.
    ///
    /// Validation is deferred to [`TemplateSourceBuilder::build`] so that
    /// every problem surfaces as a single [`ConfigError`].
    pub fn builder(host: impl Into<String>, port: i64) -> TemplateSourceBuilder {
        TemplateSourceBuilder {
            host: host.into(),
            port,
            scheme: "https".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            subdomains: Vec::new(),
            zoom_min: 0,
            zoom_max: 18,
            parallelism_limit: 1,
        }
    }

    /// The standard OpenStreetMap raster tiles.
    pub fn openstreetmap() -> Self {
        Self {
            id: SourceId {
                host: "tile.openstreetmap.org".to_string(),
                port: 443,
            },
            scheme: "https".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            subdomains: Vec::new(),
            zoom_min: 0,
            zoom_max: 18,
            parallelism_limit: 2,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Host serving `tile`, rotating across subdomains when configured.
    fn host_for(&self, tile: TileCoord) -> String {
        if self.subdomains.is_empty() {
            return self.id.host().to_string();
        }
        let index = (tile.x as usize + tile.y as usize) % self.subdomains.len();
        format!("{}.{}", self.subdomains[index], self.id.host())
    }

    fn is_default_port(&self) -> bool {
        matches!(
            (self.scheme.as_str(), self.id.port()),
            ("https", 443) | ("http", 80)
        )
    }

    fn url_error(tile: TileCoord, reason: impl Into<String>) -> FetchError {
        FetchError::UrlFormation {
            tile: tile.to_string(),
            reason: reason.into(),
        }
    }
}

impl TileSource for TemplateSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn zoom_min(&self) -> u8 {
        self.zoom_min
    }

    fn zoom_max(&self) -> u8 {
        self.zoom_max
    }

    fn parallelism_limit(&self) -> usize {
        self.parallelism_limit
    }

    fn url_for(&self, tile: TileCoord) -> Result<String, FetchError> {
        if !self.supports_zoom(tile.zoom) {
            return Err(Self::url_error(
                tile,
                format!(
                    "zoom {} outside {}..={}",
                    tile.zoom, self.zoom_min, self.zoom_max
                ),
            ));
        }
        if !tile.is_valid() {
            return Err(Self::url_error(tile, "tile index outside zoom level"));
        }

        let path = self
            .template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());

        let url = if self.is_default_port() {
            format!("{}://{}{}", self.scheme, self.host_for(tile), path)
        } else {
            format!(
                "{}://{}:{}{}",
                self.scheme,
                self.host_for(tile),
                self.id.port(),
                path
            )
        };

        Url::parse(&url).map_err(|e| Self::url_error(tile, e.to_string()))?;
        Ok(url)
    }
}

/// Builder for [`TemplateSource`].
#[derive(Debug, Clone)]
pub struct TemplateSourceBuilder {
    host: String,
    port: i64,
    scheme: String,
    template: String,
    subdomains: Vec<String>,
    zoom_min: u8,
    zoom_max: u8,
    parallelism_limit: usize,
}

impl TemplateSourceBuilder {
    /// Path template with `{z}`, `{x}` and `{y}` placeholders.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// URL scheme, `https` by default.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Subdomains prefixed to the host in rotation.
    pub fn subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    pub fn zoom_range(mut self, min: u8, max: u8) -> Self {
        self.zoom_min = min;
        self.zoom_max = max;
        self
    }

    pub fn parallelism_limit(mut self, limit: usize) -> Self {
        self.parallelism_limit = limit;
        self
    }

    /// Validates the configuration and creates the source.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid host or port, inverted or
    /// out-of-range zoom bounds, a zero parallelism limit, or a template
    /// missing one of its placeholders.
    pub fn build(self) -> Result<TemplateSource, ConfigError> {
        let id = SourceId::new(self.host, self.port)?;

        if self.zoom_min > self.zoom_max || self.zoom_max > MAX_ZOOM {
            return Err(ConfigError::InvalidZoomBounds {
                min: self.zoom_min,
                max: self.zoom_max,
            });
        }
        if self.parallelism_limit == 0 {
            return Err(ConfigError::InvalidParallelism(self.parallelism_limit));
        }
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.template.contains(placeholder) {
                return Err(ConfigError::InvalidTemplate {
                    template: self.template,
                    placeholder,
                });
            }
        }

        let template = if self.template.starts_with('/') {
            self.template
        } else {
            format!("/{}", self.template)
        };

        Ok(TemplateSource {
            id,
            scheme: self.scheme.to_lowercase(),
            template,
            subdomains: self.subdomains,
            zoom_min: self.zoom_min,
            zoom_max: self.zoom_max,
            parallelism_limit: self.parallelism_limit,
        })
    }
}
