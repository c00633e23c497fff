//! Layers, features, and the closed geometry variant set.

use std::sync::Arc;

use crate::render::{Style, WorldExtent};
use crate::resource::ResourceKey;

/// A location in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Polygon outline: one exterior ring plus interior rings (holes).
#[derive(Clone, Debug, Default)]
pub struct PolygonRings {
    pub exterior: Vec<WorldPoint>,
    pub interiors: Vec<Vec<WorldPoint>>,
}

/// A raster tile placed in the world.
///
/// The key addresses the decoded bitmap in the cache; the fetch source
/// resolves its content from the key's label.
#[derive(Clone, Debug)]
pub struct RasterSource {
    pub key: ResourceKey,
    pub extent: WorldExtent,
}

/// The closed set of drawable geometry kinds.
///
/// Draw routines dispatch over this with a single `match`; there is no open
/// type hierarchy to probe.
#[derive(Clone, Debug)]
pub enum Geometry {
    Point(WorldPoint),
    MultiPoint(Vec<WorldPoint>),
    LineString(Vec<WorldPoint>),
    MultiLineString(Vec<Vec<WorldPoint>>),
    Polygon(PolygonRings),
    MultiPolygon(Vec<PolygonRings>),
    Raster(RasterSource),
}

/// One drawable feature: a geometry and the styles to draw it with.
#[derive(Clone, Debug)]
pub struct Feature {
    pub geometry: Geometry,
    pub styles: Vec<Arc<Style>>,
}

impl Feature {
    /// A feature drawn with the default style.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            styles: vec![Arc::new(Style::default())],
        }
    }

    /// A feature drawn with the given style.
    pub fn with_style(geometry: Geometry, style: Arc<Style>) -> Self {
        Self {
            geometry,
            styles: vec![style],
        }
    }
}

/// An ordered set of features with layer-level visibility gating.
///
/// Layers are re-queried every pass; the renderer treats them as read-only
/// input.
#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub enabled: bool,
    /// Smallest resolution at which the layer shows.
    pub min_visible: f64,
    /// Largest resolution at which the layer shows.
    pub max_visible: f64,
    /// Opacity multiplied into every feature's style opacity.
    pub opacity: f32,
    pub features: Vec<Feature>,
}

impl Layer {
    /// Creates an empty, always-visible layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            min_visible: 0.0,
            max_visible: f64::INFINITY,
            opacity: 1.0,
            features: Vec::new(),
        }
    }

    /// Whether the layer applies at the given viewport resolution.
    pub fn visible_at(&self, resolution: f64) -> bool {
        self.enabled && self.min_visible <= resolution && resolution <= self.max_visible
    }
}
