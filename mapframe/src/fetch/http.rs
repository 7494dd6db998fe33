//! HTTP client abstraction for testability

use std::io::Read;
use std::time::Duration;

use reqwest::header::CONTENT_ENCODING;

use crate::error::{ConfigError, FetchError};

/// Timeout for establishing a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for receiving the response once the request is sent.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// A successful response whose body has not been read yet.
///
/// The body is a live stream; dropping the response releases the underlying
/// connection.
pub struct HttpResponse {
    /// Response body stream.
    pub body: Box<dyn Read + Send>,
    /// Value of the `Content-Encoding` header, if any.
    pub content_encoding: Option<String>,
}

impl HttpResponse {
    /// Creates a response from any readable body.
    pub fn new(body: impl Read + Send + 'static, content_encoding: Option<String>) -> Self {
        Self {
            body: Box::new(body),
            content_encoding,
        }
    }

    /// True if the body is gzip-compressed.
    pub fn is_gzip(&self) -> bool {
        self.content_encoding
            .as_deref()
            .map(|enc| enc.trim().eq_ignore_ascii_case("gzip"))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("content_encoding", &self.content_encoding)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response with an unread body, or [`FetchError::Network`] on
    /// connection failure, timeout or a non-success status.
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Real HTTP client implementation using reqwest.
///
/// Transparent decompression is not enabled on the client; the fetcher
/// inspects `Content-Encoding` and decompresses itself.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the standard connect/read timeouts.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_timeouts(CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    /// Creates a client with custom timeouts.
    ///
    /// `read_timeout` bounds the request from connect until the body is
    /// fully received, so a slow-but-alive server can hold a worker for at
    /// most that long.
    pub fn with_timeouts(
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .user_agent(concat!("mapframe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(format!("Request failed: {}", e)))?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let content_encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(HttpResponse::new(response, content_encoding))
    }
}
