//! Error types for the fetch path.

use thiserror::Error;

/// A failure fetching or decoding one resource.
///
/// Always scoped to a single request: workers report it as a failed outcome
/// and move on, they never die on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (connect error, timeout, non-2xx status).
    #[error("http request failed for {url}: {reason}")]
    Http { url: String, reason: String },

    /// The payload arrived but could not be decoded into a bitmap.
    #[error("decode failed: {0}")]
    Decode(String),

    /// A source-specific failure outside transport and decode.
    #[error("source error: {0}")]
    Source(String),

    /// A panic escaped the fetch path and was converted into a failed
    /// outcome for the offending request.
    #[error("fetch task panicked")]
    Panicked,
}
