//! Rendered-bitmap resources shared between the render thread and fetch
//! workers.
//!
//! Three pieces live here:
//!
//! - [`ResourceKey`] — identity-based cache addressing
//! - [`Bitmap`] / [`BitmapResource`] — shared decoded-image handles
//! - [`ResourceCache`] — the iteration-aged cache with its per-pass
//!   eviction sweep

mod bitmap;
mod cache;
mod key;

pub use bitmap::{Bitmap, BitmapResource};
pub use cache::{CacheStats, ResourceCache, DEFAULT_KEEP_MULTIPLIER, DEFAULT_MIN_KEEP};
pub use key::ResourceKey;
