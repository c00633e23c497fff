//! Fetch+decode source abstraction.
//!
//! Workers are generic over where bitmaps come from; anything that can turn
//! a [`ResourceKey`] into decoded pixels plugs in here. The HTTP-backed
//! implementation lives in [`crate::fetch::HttpTileSource`]; tests use
//! in-memory mocks.

use crate::fetch::{BoxFuture, FetchError};
use crate::resource::{Bitmap, ResourceKey};

/// Turns a resource key into a decoded bitmap.
///
/// The call may block on I/O or burn CPU decoding; it runs on a fetch worker,
/// decoupled from the render thread's cadence. No timeout is imposed here;
/// bounding a hung fetch is the source's responsibility.
pub trait TileFetcher: Send + Sync {
    /// Fetches and decodes the resource behind `key`.
    fn fetch(&self, key: ResourceKey) -> BoxFuture<'_, Result<Bitmap, FetchError>>;
}
