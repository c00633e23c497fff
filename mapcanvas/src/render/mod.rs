//! Map rendering: layers, features, styles, and the per-frame pass.

mod draw;
mod feature;
mod renderer;
mod style;
mod viewport;

pub use feature::{Feature, Geometry, Layer, PolygonRings, RasterSource, WorldPoint};
pub use renderer::MapRenderer;
pub use style::{StrokeStyle, Style};
pub use viewport::{Viewport, WorldExtent};
