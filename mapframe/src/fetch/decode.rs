//! Tile payload decoding.

use tiny_skia::{IntSize, Pixmap};

use crate::error::FetchError;

/// In-memory raster the pipeline draws with.
///
/// Pixels are premultiplied RGBA, as required by `tiny-skia`.
pub type Bitmap = Pixmap;

/// Turns an encoded tile payload into a [`Bitmap`].
pub trait TileDecoder: Send + Sync {
    /// Decodes `bytes`.
    ///
    /// # Errors
    ///
    /// [`FetchError::Decode`] for malformed or unsupported payloads.
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, FetchError>;
}

/// Decoder for the raster formats served by tile servers (PNG, JPEG),
/// backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl TileDecoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, FetchError> {
        let image =
            image::load_from_memory(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        let size = IntSize::from_wh(width, height).ok_or_else(|| {
            FetchError::Decode(format!("invalid image size {}x{}", width, height))
        })?;

        let mut data = rgba.into_raw();
        premultiply(&mut data);

        Pixmap::from_vec(data, size)
            .ok_or_else(|| FetchError::Decode("pixel buffer does not match size".to_string()))
    }
}

/// Converts straight RGBA into premultiplied RGBA in place.
fn premultiply(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3] as u16;
        if alpha == 255 {
            continue;
        }
        for channel in &mut px[..3] {
            *channel = ((*channel as u16 * alpha + 127) / 255) as u8;
        }
    }
}
