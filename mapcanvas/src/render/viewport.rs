//! Viewport: the visible world window and its mapping to screen pixels.

use tiny_skia::Rect;

/// Axis-aligned extent in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl WorldExtent {
    /// Creates an extent from its corners.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Extent width in world units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent height in world units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// The visible window for one render pass.
///
/// `resolution` is world units per pixel; world y grows upward, screen y
/// grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// World x at the center of the screen.
    pub center_x: f64,
    /// World y at the center of the screen.
    pub center_y: f64,
    /// World units per pixel.
    pub resolution: f64,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    pub fn new(center_x: f64, center_y: f64, resolution: f64, width: u32, height: u32) -> Self {
        Self {
            center_x,
            center_y,
            resolution,
            width,
            height,
        }
    }

    /// A viewport that can actually be drawn to: non-zero surface, positive
    /// finite resolution.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.resolution > 0.0 && self.resolution.is_finite()
    }

    /// Maps world coordinates to screen pixels.
    pub fn world_to_screen(&self, x: f64, y: f64) -> (f32, f32) {
        let sx = (x - self.center_x) / self.resolution + self.width as f64 / 2.0;
        let sy = (self.center_y - y) / self.resolution + self.height as f64 / 2.0;
        (sx as f32, sy as f32)
    }

    /// Screen rectangle covered by a world extent, if non-degenerate.
    pub fn screen_rect(&self, extent: &WorldExtent) -> Option<Rect> {
        let (left, bottom) = self.world_to_screen(extent.min_x, extent.min_y);
        let (right, top) = self.world_to_screen(extent.max_x, extent.max_y);
        let rect = Rect::from_ltrb(left, top, right, bottom)?;
        if rect.width() > 0.0 && rect.height() > 0.0 {
            Some(rect)
        } else {
            None
        }
    }
}
