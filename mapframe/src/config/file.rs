//! Configuration file handling for `config.ini`.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::ConfigError;
use crate::logging::{default_log_dir, default_log_file};
use crate::model::DEFAULT_OVERDRAW_FACTOR;
use crate::source::{TemplateSource, DEFAULT_TEMPLATE};
use crate::viewer::ViewerConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// A value is present but malformed
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Values parse individually but do not form a valid source
    #[error("Invalid tile source: {0}")]
    Source(#[from] ConfigError),
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub host: String,
    pub port: i64,
    pub scheme: String,
    pub template: String,
    pub subdomains: Vec<String>,
    pub zoom_min: u8,
    pub zoom_max: u8,
    pub parallelism: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            host: "tile.openstreetmap.org".to_string(),
            port: 443,
            scheme: "https".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            subdomains: Vec::new(),
            zoom_min: 0,
            zoom_max: 18,
            parallelism: 2,
        }
    }
}

impl SourceSettings {
    /// Builds the tile source these settings describe.
    pub fn build_source(&self) -> Result<TemplateSource, ConfigError> {
        TemplateSource::builder(self.host.clone(), self.port)
            .scheme(self.scheme.clone())
            .template(self.template.clone())
            .subdomains(self.subdomains.iter().cloned())
            .zoom_range(self.zoom_min, self.zoom_max)
            .parallelism_limit(self.parallelism)
            .build()
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Tiles kept in memory.
    pub capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// `[view]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub overdraw_factor: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            overdraw_factor: DEFAULT_OVERDRAW_FACTOR,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(default_log_dir()),
            file: default_log_file().to_string(),
        }
    }
}

/// Contents of `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub source: SourceSettings,
    pub cache: CacheSettings,
    pub view: ViewSettings,
    pub log: LogSettings,
}

impl ConfigFile {
    /// Load configuration from the default path.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn parse(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }

    /// Viewer settings derived from this file.
    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig::default()
            .with_overdraw_factor(self.view.overdraw_factor)
            .with_cache_capacity(self.cache.capacity)
    }
}

/// Get the path to the config directory (`<config dir>/mapframe`).
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mapframe")
}

/// Get the path to the config file (`<config dir>/mapframe/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
