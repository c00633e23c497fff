//! Mapcanvas - interactive map layer rendering with asynchronous tile fetching
//!
//! This library renders vector geometry and raster tiles onto a drawable
//! surface at interactive frame rates while tiles and symbol bitmaps are
//! fetched and decoded on background workers. The heart of it is the
//! iteration-aged bitmap cache shared between the render thread and the
//! fetch worker pool:
//!
//! - [`resource`] — identity-keyed [`ResourceCache`] with its once-per-pass
//!   eviction sweep, plus the shared [`Bitmap`] handles it stores
//! - [`fetch`] — [`TileFetchDispatcher`], [`FetchWorker`]s under a
//!   [`FetchPool`], and the [`TileFetcher`] source abstraction
//! - [`render`] — [`MapRenderer`] driving one pass per frame over layers of
//!   vector and raster features
//!
//! The render thread never blocks on a fetch: a cache miss enqueues a
//! request and degrades to "nothing drawn for that feature this pass".

pub mod config;
pub mod fetch;
pub mod logging;
pub mod render;
pub mod resource;

pub use config::{CacheConfig, FetchConfig, RendererConfig};
pub use fetch::{
    BoxFuture, FetchDispatcher, FetchError, FetchOutcome, FetchPool, FetchRequest, FetchWorker,
    HttpTileSource, Priority, RequestSink, TileFetchDispatcher, TileFetcher,
};
pub use render::{
    Feature, Geometry, Layer, MapRenderer, PolygonRings, RasterSource, StrokeStyle, Style,
    Viewport, WorldExtent, WorldPoint,
};
pub use resource::{Bitmap, BitmapResource, CacheStats, ResourceCache, ResourceKey};
