//! Configuration file support.
//!
//! Settings live in an INI file, by default
//! `<config dir>/mapframe/config.ini`:
//!
//! ```ini
//! [source]
//! host = tile.openstreetmap.org
//! port = 443
//! scheme = https
//! template = /{z}/{x}/{y}.png
//! subdomains =
//! zoom_min = 0
//! zoom_max = 18
//! parallelism = 2
//!
//! [cache]
//! capacity = 512
//!
//! [view]
//! overdraw_factor = 1.2
//!
//! [log]
//! directory = logs
//! file = mapframe.log
//! ```
//!
//! Missing keys keep their defaults. A present but malformed value is an
//! error, never silently replaced.

mod file;
mod parser;

pub use file::{
    config_directory, config_file_path, CacheSettings, ConfigFile, ConfigFileError, LogSettings,
    SourceSettings, ViewSettings,
};
