//! HTTP-backed tile source.
//!
//! Treats the resource key's label as the request URL, downloads the payload
//! with reqwest, and decodes it into a [`Bitmap`] with the `image` crate.

use std::time::Duration;

use bytes::Bytes;
use tiny_skia::{ColorU8, Pixmap};
use tracing::trace;

use crate::fetch::{BoxFuture, FetchError, TileFetcher};
use crate::resource::{Bitmap, ResourceKey};

/// Default timeout for one tile download.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Tile source downloading encoded bitmaps over HTTP.
pub struct HttpTileSource {
    client: reqwest::Client,
}

impl HttpTileSource {
    /// Creates a source with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a source with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Source(format!("failed to create http client: {e}")))?;
        Ok(Self { client })
    }

    async fn download(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        response.bytes().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            reason: format!("failed to read body: {e}"),
        })
    }
}

impl TileFetcher for HttpTileSource {
    fn fetch(&self, key: ResourceKey) -> BoxFuture<'_, Result<Bitmap, FetchError>> {
        Box::pin(async move {
            let url = key.label().to_string();
            let body = self.download(&url).await?;
            trace!(key_id = key.id(), bytes = body.len(), "tile downloaded");
            decode_bitmap(&body)
        })
    }
}

/// Decodes an encoded image payload (PNG, JPEG, ...) into a bitmap.
pub fn decode_bitmap(data: &[u8]) -> Result<Bitmap, FetchError> {
    let decoded = image::load_from_memory(data).map_err(|e| FetchError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| FetchError::Decode(format!("unsupported dimensions {width}x{height}")))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    Ok(Bitmap::new(pixmap))
}
