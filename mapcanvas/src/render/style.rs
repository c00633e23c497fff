//! Feature styling.
//!
//! Styles are shared between features via `Arc`; when a style references a
//! symbol bitmap, the cache slot for it is the style's [`ResourceKey`]
//! identity, so two structurally identical styles keep separate slots.

use tiny_skia::Color;

use crate::resource::ResourceKey;

/// Stroke appearance for lines and outlines.
#[derive(Clone, Debug)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
        }
    }
}

/// How one feature is drawn.
#[derive(Clone, Debug)]
pub struct Style {
    /// Disabled styles are skipped entirely.
    pub enabled: bool,
    /// Smallest resolution (most zoomed in) at which the style shows.
    pub min_visible: f64,
    /// Largest resolution (most zoomed out) at which the style shows.
    pub max_visible: f64,
    /// Style opacity, multiplied with the layer's.
    pub opacity: f32,
    /// Fill color for areas and points.
    pub fill: Option<Color>,
    /// Stroke for lines and outlines.
    pub stroke: Option<StrokeStyle>,
    /// Symbol bitmap to draw at point locations, addressed by identity.
    pub symbol: Option<ResourceKey>,
    /// Scale applied to the symbol bitmap.
    pub symbol_scale: f32,
    /// Radius of the fallback circle for points without a symbol.
    pub point_radius: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            enabled: true,
            min_visible: 0.0,
            max_visible: f64::INFINITY,
            opacity: 1.0,
            fill: Some(Color::from_rgba8(120, 120, 120, 255)),
            stroke: Some(StrokeStyle::default()),
            symbol: None,
            symbol_scale: 1.0,
            point_radius: 4.0,
        }
    }
}

impl Style {
    /// Whether the style applies at the given viewport resolution.
    pub fn visible_at(&self, resolution: f64) -> bool {
        self.enabled && self.min_visible <= resolution && resolution <= self.max_visible
    }
}
