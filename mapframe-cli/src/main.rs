//! MapFrame CLI - Command-line interface
//!
//! Headless front-end to the mapframe pipeline: renders a view of the
//! configured tile source to an image file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mapframe::config::{ConfigFile, ConfigFileError};
use mapframe::logging::init_logging;
use tracing::info;

use commands::config::ConfigCommands;
use commands::render::RenderArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "mapframe")]
#[command(version, about = "Render raster map tiles to an image", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a view to an image file
    Render {
        /// Latitude of the view centre
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude of the view centre
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom level
        #[arg(long, default_value = "12")]
        zoom: u8,

        /// View width in pixels
        #[arg(long, default_value = "800", value_parser = clap::value_parser!(u32).range(1..=16384))]
        width: u32,

        /// View height in pixels
        #[arg(long, default_value = "600", value_parser = clap::value_parser!(u32).range(1..=16384))]
        height: u32,

        /// Output image path (format from extension)
        #[arg(long, short)]
        output: PathBuf,

        /// Give up waiting for tiles after this many seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },

    /// Show the configured tile source
    Source,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn load_config(path: Option<&PathBuf>) -> Result<ConfigFile, ConfigFileError> {
    match path {
        Some(path) => ConfigFile::load_from(path),
        None => ConfigFile::load(),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Render {
            lat,
            lon,
            zoom,
            width,
            height,
            output,
            timeout_secs,
        } => {
            let _logging = init_logging(&config.log.directory, &config.log.file)
                .map_err(CliError::Logging)?;
            info!(version = env!("CARGO_PKG_VERSION"), "mapframe starting");

            commands::render::run(
                RenderArgs {
                    latitude: lat,
                    longitude: lon,
                    zoom,
                    width,
                    height,
                    output,
                    timeout_secs,
                },
                &config,
            )
        }
        Commands::Source => commands::source::run(&config),
        Commands::Config(command) => commands::config::run(command, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}
