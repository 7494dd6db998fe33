//! Source command - describe the configured tile source.

use mapframe::config::ConfigFile;
use mapframe::coord::TileCoord;
use mapframe::pool::pool_size;
use mapframe::source::TileSource;

use crate::error::CliError;

/// Run the source command.
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let source = config.source.build_source()?;

    println!("Tile source");
    println!("───────────");
    println!("  Identity:    {}", source.id());
    println!("  Template:    {}", source.template());
    if !source.subdomains().is_empty() {
        println!("  Subdomains:  {}", source.subdomains().join(", "));
    }
    println!("  Zoom levels: {}-{}", source.zoom_min(), source.zoom_max());
    println!(
        "  Parallelism: {} declared, {} workers",
        source.parallelism_limit(),
        pool_size(source.parallelism_limit())
    );

    let sample = TileCoord::new(0, 0, source.zoom_min());
    match source.url_for(sample) {
        Ok(url) => println!("  Example URL: {}", url),
        Err(e) => println!("  Example URL: unavailable ({})", e),
    }
    Ok(())
}
