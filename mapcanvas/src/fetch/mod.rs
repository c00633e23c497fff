//! Asynchronous tile fetching.
//!
//! Render-time cache misses are submitted through [`RequestSink`], queued by
//! the [`TileFetchDispatcher`], pulled by [`FetchWorker`]s under a
//! [`FetchPool`], resolved against a [`TileFetcher`] source, and reported
//! back as [`FetchOutcome`]s that land in the shared bitmap cache. The
//! render thread never blocks on any of it.

mod dispatcher;
mod error;
mod http;
mod pool;
mod request;
mod source;
mod worker;

pub use dispatcher::{BoxFuture, FetchDispatcher, RequestSink, TileFetchDispatcher};
pub use error::FetchError;
pub use http::{decode_bitmap, HttpTileSource, DEFAULT_HTTP_TIMEOUT};
pub use pool::{FetchPool, DEFAULT_WORKER_COUNT};
pub use request::{FetchOutcome, FetchRequest, Priority};
pub use source::TileFetcher;
pub use worker::FetchWorker;
