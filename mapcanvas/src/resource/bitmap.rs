//! Decoded bitmap handles.
//!
//! A [`Bitmap`] is a shared, immutable handle over decoded pixels. The cache
//! stores one handle per entry and hands out clones on hits; the pixels are
//! freed exactly once, when the last handle drops. An eviction therefore
//! never pulls pixels out from under a draw call that is still holding a
//! clone from this pass.

use std::fmt;
use std::sync::Arc;

use tiny_skia::{Pixmap, PixmapRef};

/// Shared handle over a decoded bitmap.
///
/// Cloning shares the underlying pixels; the bitmap is immutable once
/// created.
#[derive(Clone)]
pub struct Bitmap(Arc<Pixmap>);

impl Bitmap {
    /// Wraps a decoded pixmap into a shared handle.
    pub fn new(pixmap: Pixmap) -> Self {
        Self(Arc::new(pixmap))
    }

    /// Bitmap width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Bitmap height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Borrows the pixels for drawing.
    pub fn as_pixmap_ref(&self) -> PixmapRef<'_> {
        (*self.0).as_ref()
    }

    /// Number of live handles sharing these pixels, including this one.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("handles", &self.handle_count())
            .finish()
    }
}

/// A cache hit: the decoded image plus the render iteration in which the
/// entry was last used.
#[derive(Clone, Debug)]
pub struct BitmapResource {
    /// Decoded image handle.
    pub image: Bitmap,
    /// Iteration number recorded for this entry at the time of the lookup.
    pub last_iteration_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pixmap(width: u32, height: u32) -> Pixmap {
        Pixmap::new(width, height).expect("non-zero pixmap")
    }

    #[test]
    fn test_dimensions() {
        let bitmap = Bitmap::new(test_pixmap(256, 128));
        assert_eq!(bitmap.width(), 256);
        assert_eq!(bitmap.height(), 128);
    }

    #[test]
    fn test_clone_shares_pixels() {
        let bitmap = Bitmap::new(test_pixmap(4, 4));
        assert_eq!(bitmap.handle_count(), 1);

        let clone = bitmap.clone();
        assert_eq!(bitmap.handle_count(), 2);

        drop(clone);
        assert_eq!(bitmap.handle_count(), 1);
    }

    #[test]
    fn test_pixels_outlive_cache_drop() {
        let bitmap = Bitmap::new(test_pixmap(8, 8));
        let in_flight_draw = bitmap.clone();

        // Simulates eviction dropping the cache's handle mid-draw.
        drop(bitmap);

        assert_eq!(in_flight_draw.width(), 8);
        assert_eq!(in_flight_draw.handle_count(), 1);
    }
}
