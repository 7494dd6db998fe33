//! Tile fetching.
//!
//! The [`Fetcher`] turns one [`Job`] into a decoded [`Bitmap`]:
//!
//! ```text
//! Job ──► source.url_for ──► HttpClient::get ──► [gzip?] ──► TileDecoder ──► Bitmap
//! ```
//!
//! The response body is owned by the fetch call and dropped on every exit
//! path, so the connection is released whether the fetch succeeds, the
//! read fails half way, or decoding rejects the payload. The fetcher never
//! retries.

mod decode;
mod http;

pub use decode::{Bitmap, ImageDecoder, TileDecoder};
pub use http::{HttpClient, HttpResponse, ReqwestClient, CONNECT_TIMEOUT, READ_TIMEOUT};

#[cfg(test)]
pub use http::tests::{MockHttpClient, TrackedBody};

use std::io::Read;
use std::sync::Arc;

use flate2::read::GzDecoder;
use tracing::trace;

use crate::error::FetchError;
use crate::job::Job;
use crate::source::TileSource;

/// Turns a job into a bitmap.
///
/// Implemented by [`Fetcher`]; the worker pool depends on this trait so that
/// tests can simulate latency and failures without a network.
pub trait TileFetcher: Send + Sync {
    /// Fetches and decodes the tile named by `job` from `source`.
    fn fetch(&self, job: &Job, source: &dyn TileSource) -> Result<Bitmap, FetchError>;
}

/// HTTP tile fetcher with transparent gzip handling.
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    decoder: Arc<dyn TileDecoder>,
}

impl Fetcher {
    pub fn new(client: Arc<dyn HttpClient>, decoder: Arc<dyn TileDecoder>) -> Self {
        Self { client, decoder }
    }

    /// Reads the whole body, decompressing it when it is gzip-encoded.
    ///
    /// Takes the response by value: the body stream is dropped when this
    /// function returns, on success and on error alike.
    fn read_body(response: HttpResponse) -> Result<Vec<u8>, FetchError> {
        let gzip = response.is_gzip();
        let mut body: Box<dyn Read + Send> = if gzip {
            Box::new(GzDecoder::new(response.body))
        } else {
            response.body
        };

        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes).map_err(|e| {
            if gzip && e.kind() == std::io::ErrorKind::InvalidInput {
                FetchError::Decode(format!("gzip: {}", e))
            } else {
                FetchError::from(e)
            }
        })?;
        Ok(bytes)
    }
}

impl TileFetcher for Fetcher {
    fn fetch(&self, job: &Job, source: &dyn TileSource) -> Result<Bitmap, FetchError> {
        let url = source.url_for(job.tile())?;
        trace!(job = %job, url = %url, "Fetching tile");

        let response = self.client.get(&url)?;
        let bytes = Self::read_body(response)?;

        self.decoder.decode(&bytes)
    }
}
