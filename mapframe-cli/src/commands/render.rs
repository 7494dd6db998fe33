//! Render command - fetch the tiles around a position and write the view to
//! an image file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use mapframe::cache::MemoryTileCache;
use mapframe::config::ConfigFile;
use mapframe::coord::{Dimension, MapPosition};
use mapframe::source::TileSource;
use mapframe::surface::NullSurface;
use mapframe::MapViewer;
use tiny_skia::Pixmap;
use tracing::{info, warn};

use crate::error::CliError;

/// How often the wait loop checks for Ctrl+C.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Arguments for the render command.
pub struct RenderArgs {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
    pub timeout_secs: u64,
}

/// Run the render command.
pub fn run(args: RenderArgs, config: &ConfigFile) -> Result<(), CliError> {
    let source: Arc<dyn TileSource> = Arc::new(config.source.build_source()?);
    if !source.supports_zoom(args.zoom) {
        return Err(CliError::Config(format!(
            "zoom {} is outside the range served by {} ({}-{})",
            args.zoom,
            source.name(),
            source.zoom_min(),
            source.zoom_max()
        )));
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let cache = Arc::new(MemoryTileCache::new(config.cache.capacity));
    let viewer = MapViewer::start(
        config.viewer_config(),
        Arc::clone(&source),
        cache.clone(),
        Arc::new(NullSurface),
    )?;

    println!("Source:  {} ({} workers)", source.id(), viewer.pool_size());
    println!(
        "View:    {:.5}, {:.5} at zoom {} ({}x{})",
        args.latitude, args.longitude, args.zoom, args.width, args.height
    );

    let view = viewer.view();
    view.position()
        .set_position(MapPosition::new(args.latitude, args.longitude, args.zoom));
    view.dimension()
        .set_dimension(Dimension::new(args.width as i32, args.height as i32));

    let complete = wait_for_tiles(&viewer, Duration::from_secs(args.timeout_secs), &shutdown)?;
    if !complete {
        warn!(
            pending = viewer.queue().len(),
            in_flight = viewer.queue().in_flight(),
            "Timed out waiting for tiles, writing partial frame"
        );
        println!("Timed out waiting for tiles; some may be missing");
        viewer.layers().flush();
    }

    let mut canvas = Pixmap::new(args.width, args.height)
        .ok_or_else(|| CliError::Config("view dimension is empty".to_string()))?;
    viewer.draw(&mut canvas.as_mut());
    viewer.shutdown();

    write_image(&canvas, &args.output)?;

    let stats = cache.stats();
    info!(
        output = %args.output.display(),
        tiles = cache.entry_count(),
        hit_rate = stats.hit_rate(),
        "Frame written"
    );
    println!("Tiles:   {} cached", cache.entry_count());
    println!("Output:  {}", args.output.display());
    Ok(())
}

/// Waits for the viewer to go idle, checking for Ctrl+C between polls.
///
/// Returns false on timeout.
fn wait_for_tiles(
    viewer: &MapViewer,
    timeout: Duration,
    shutdown: &AtomicBool,
) -> Result<bool, CliError> {
    let deadline = Instant::now() + timeout;
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return Err(CliError::Interrupted);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }
        if viewer.wait_idle(remaining.min(POLL_INTERVAL)) {
            return Ok(true);
        }
    }
}

/// Converts the premultiplied pixmap to straight RGBA and writes it.
fn write_image(pixmap: &Pixmap, path: &Path) -> Result<(), CliError> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let image = RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| CliError::Output("pixel buffer size mismatch".to_string()))?;
    image
        .save(path)
        .map_err(|e| CliError::Output(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    #[test]
    fn test_write_image_png() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("frame.png");

        let mut pixmap = Pixmap::new(4, 3).unwrap();
        pixmap.fill(Color::from_rgba8(10, 20, 30, 255));
        write_image(&pixmap, &path).unwrap();

        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_write_image_unknown_extension() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("frame.unknown");

        let pixmap = Pixmap::new(2, 2).unwrap();
        assert!(matches!(
            write_image(&pixmap, &path),
            Err(CliError::Output(_))
        ));
    }
}
