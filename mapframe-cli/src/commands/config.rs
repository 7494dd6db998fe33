//! Configuration inspection CLI commands.

use clap::Subcommand;
use mapframe::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration in INI form
    Show,

    /// Show the default configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            print!("{}", render_ini(config));
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
    }
}

/// Formats `config` as INI text that [`ConfigFile::parse`] reads back.
fn render_ini(config: &ConfigFile) -> String {
    let source = &config.source;
    format!(
        "[source]\n\
         host = {}\n\
         port = {}\n\
         scheme = {}\n\
         template = {}\n\
         subdomains = {}\n\
         zoom_min = {}\n\
         zoom_max = {}\n\
         parallelism = {}\n\
         \n\
         [cache]\n\
         capacity = {}\n\
         \n\
         [view]\n\
         overdraw_factor = {}\n\
         \n\
         [log]\n\
         directory = {}\n\
         file = {}\n",
        source.host,
        source.port,
        source.scheme,
        source.template,
        source.subdomains.join(","),
        source.zoom_min,
        source.zoom_max,
        source.parallelism,
        config.cache.capacity,
        config.view.overdraw_factor,
        config.log.directory.display(),
        config.log.file,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ini_reads_back_default() {
        let config = ConfigFile::default();
        assert_eq!(ConfigFile::parse(&render_ini(&config)).unwrap(), config);
    }

    #[test]
    fn test_render_ini_reads_back_custom() {
        let config = ConfigFile::parse(
            "[source]\nhost = tiles.local\nport = 8080\nscheme = http\nsubdomains = a,b\n\
             [view]\noverdraw_factor = 1.5\n",
        )
        .unwrap();
        let text = render_ini(&config);
        assert!(text.contains("subdomains = a,b"));
        assert_eq!(ConfigFile::parse(&text).unwrap(), config);
    }
}
