//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError};

const PORT_REASON: &str = "must be an integer within 0..=65535";
const ZOOM_REASON: &str = "must be a zoom level (0-22)";

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses `key` from `section` if present.
fn parse_value<T: FromStr>(
    properties: &Properties,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match properties.get(key) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, v, reason)),
        None => Ok(None),
    }
}

/// Non-empty trimmed string value of `key`, if present.
fn string_value<'a>(properties: &'a Properties, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = string_value(section, "host") {
            config.source.host = v.to_string();
        }
        if let Some(port) = parse_value::<i64>(section, "source", "port", PORT_REASON)? {
            if !(0..=65535).contains(&port) {
                return Err(invalid("source", "port", &port.to_string(), PORT_REASON));
            }
            config.source.port = port;
        }
        if let Some(v) = string_value(section, "scheme") {
            let v = v.to_lowercase();
            if v != "http" && v != "https" {
                return Err(invalid("source", "scheme", &v, "must be 'http' or 'https'"));
            }
            config.source.scheme = v;
        }
        if let Some(v) = string_value(section, "template") {
            for placeholder in ["{z}", "{x}", "{y}"] {
                if !v.contains(placeholder) {
                    return Err(invalid(
                        "source",
                        "template",
                        v,
                        "must contain {z}, {x} and {y}",
                    ));
                }
            }
            config.source.template = v.to_string();
        }
        if let Some(v) = section.get("subdomains") {
            config.source.subdomains = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = parse_value(section, "source", "zoom_min", ZOOM_REASON)? {
            config.source.zoom_min = v;
        }
        if let Some(v) = parse_value(section, "source", "zoom_max", ZOOM_REASON)? {
            config.source.zoom_max = v;
        }
        if let Some(v) = parse_value::<usize>(
            section,
            "source",
            "parallelism",
            "must be a positive integer",
        )? {
            if v == 0 {
                return Err(invalid(
                    "source",
                    "parallelism",
                    "0",
                    "must be a positive integer",
                ));
            }
            config.source.parallelism = v;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = parse_value(section, "cache", "capacity", "must be a number of tiles")? {
            config.cache.capacity = v;
        }
    }

    // [view] section
    if let Some(section) = ini.section(Some("view")) {
        if let Some(v) = parse_value::<f64>(
            section,
            "view",
            "overdraw_factor",
            "must be a number of at least 1.0",
        )? {
            if !v.is_finite() || v < 1.0 {
                return Err(invalid(
                    "view",
                    "overdraw_factor",
                    &v.to_string(),
                    "must be a number of at least 1.0",
                ));
            }
            config.view.overdraw_factor = v;
        }
    }

    // [log] section
    if let Some(section) = ini.section(Some("log")) {
        if let Some(v) = string_value(section, "directory") {
            config.log.directory = PathBuf::from(v);
        }
        if let Some(v) = string_value(section, "file") {
            config.log.file = v.to_string();
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(content).unwrap())
    }

    fn assert_invalid(content: &str, expected_key: &str) {
        match parse(content) {
            Err(ConfigFileError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected InvalidValue for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn test_empty_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_full_source_section() {
        let config = parse(
            "[source]\n\
             host = tile.example.org\n\
             port = 8443\n\
             scheme = HTTPS\n\
             template = tiles/{z}/{x}/{y}.webp\n\
             subdomains = a, b ,c\n\
             zoom_min = 2\n\
             zoom_max = 16\n\
             parallelism = 12\n",
        )
        .unwrap();

        assert_eq!(config.source.host, "tile.example.org");
        assert_eq!(config.source.port, 8443);
        assert_eq!(config.source.scheme, "https");
        assert_eq!(config.source.template, "tiles/{z}/{x}/{y}.webp");
        assert_eq!(config.source.subdomains, vec!["a", "b", "c"]);
        assert_eq!((config.source.zoom_min, config.source.zoom_max), (2, 16));
        // Values above the worker cap are accepted and clamped by the pool
        assert_eq!(config.source.parallelism, 12);
    }

    #[test]
    fn test_view_and_log_sections() {
        let config = parse(
            "[view]\noverdraw_factor = 1.5\n[log]\ndirectory = /tmp/mf\nfile = run.log\n",
        )
        .unwrap();
        assert_eq!(config.view.overdraw_factor, 1.5);
        assert_eq!(config.log.directory, PathBuf::from("/tmp/mf"));
        assert_eq!(config.log.file, "run.log");
    }

    #[test]
    fn test_invalid_values() {
        assert_invalid("[source]\nport = 70000\n", "port");
        assert_invalid("[source]\nport = abc\n", "port");
        assert_invalid("[source]\nscheme = ftp\n", "scheme");
        assert_invalid("[source]\ntemplate = /{z}/{x}.png\n", "template");
        assert_invalid("[source]\nzoom_max = 300\n", "zoom_max");
        assert_invalid("[source]\nparallelism = 0\n", "parallelism");
        assert_invalid("[cache]\ncapacity = lots\n", "capacity");
        assert_invalid("[view]\noverdraw_factor = 0.5\n", "overdraw_factor");
    }

    #[test]
    fn test_invalid_value_message() {
        let err = parse("[source]\nscheme = ftp\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: source.scheme = 'ftp' - must be 'http' or 'https'"
        );
    }

    #[test]
    fn test_blank_host_keeps_default() {
        let config = parse("[source]\nhost =   \n").unwrap();
        assert_eq!(config.source.host, "tile.openstreetmap.org");
    }
}
