//! CLI error type.

use std::fmt;
use std::io;

use mapframe::config::ConfigFileError;
use mapframe::{ConfigError, ViewerError};

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or inconsistent settings
    Config(String),
    /// The configuration file could not be read or parsed
    ConfigFile(ConfigFileError),
    /// Logging could not be initialized
    Logging(io::Error),
    /// The viewer pipeline failed to start
    Viewer(ViewerError),
    /// The rendered image could not be written
    Output(String),
    /// Interrupted by Ctrl+C
    Interrupted,
}

impl CliError {
    /// Print the error and exit with a non-zero status.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(match self {
            CliError::Interrupted => 130,
            _ => 1,
        });
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Viewer(e) => write!(f, "Failed to start viewer: {}", e),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
            CliError::Interrupted => write!(f, "Interrupted"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Viewer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ViewerError> for CliError {
    fn from(e: ViewerError) -> Self {
        CliError::Viewer(e)
    }
}
