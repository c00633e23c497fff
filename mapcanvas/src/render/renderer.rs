//! Per-frame render pass orchestration.
//!
//! [`MapRenderer::render`] is one pass: walk the visible layers, draw each
//! feature with every applicable style (bitmap-backed features resolve
//! through the shared cache, misses go to the fetch side asynchronously),
//! then run the eviction sweep and advance the iteration counter, in that
//! order, which is what makes the sweep see the pass just finished.
//!
//! A panic anywhere in the pass body is caught at the pass boundary, logged,
//! and abandons that frame only; neither the sweep nor the counter advance
//! runs, and the next pass starts cleanly. Cache state stays consistent
//! because every cache mutation is a single locked operation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tiny_skia::{Color, Pixmap, PixmapMut};
use tracing::{debug, error, warn};

use crate::fetch::RequestSink;
use crate::render::{draw, Layer, Viewport};
use crate::resource::ResourceCache;

/// Renders map layers onto a drawable surface, one pass at a time.
pub struct MapRenderer {
    cache: Arc<ResourceCache>,
    requests: Option<Arc<dyn RequestSink>>,
}

impl MapRenderer {
    /// A renderer without a fetch side: cache misses simply draw nothing.
    pub fn new(cache: Arc<ResourceCache>) -> Self {
        Self {
            cache,
            requests: None,
        }
    }

    /// A renderer that submits cache misses to the given sink.
    pub fn with_request_sink(cache: Arc<ResourceCache>, requests: Arc<dyn RequestSink>) -> Self {
        Self {
            cache,
            requests: Some(requests),
        }
    }

    /// The shared bitmap cache.
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Runs one render pass against the target surface.
    pub fn render(
        &self,
        canvas: &mut PixmapMut<'_>,
        viewport: &Viewport,
        layers: &[Layer],
        background: Option<Color>,
    ) {
        if let Some(color) = background {
            canvas.fill(color);
        }
        if !viewport.is_valid() {
            warn!(?viewport, "skipping render pass for invalid viewport");
            return;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.render_layers(canvas, viewport, layers);

            let evicted = self.cache.evict_unused();
            if evicted > 0 {
                debug!(
                    evicted,
                    iteration = self.cache.current_iteration(),
                    remaining = self.cache.len(),
                    "evicted unused bitmaps"
                );
            }
            self.cache.advance_iteration();
        }));

        if let Err(payload) = result {
            error!(
                reason = panic_message(&payload),
                "render pass panicked, frame abandoned"
            );
        }
    }

    fn render_layers(&self, canvas: &mut PixmapMut<'_>, viewport: &Viewport, layers: &[Layer]) {
        for layer in layers {
            if !layer.visible_at(viewport.resolution) {
                continue;
            }
            for feature in &layer.features {
                for style in &feature.styles {
                    if !style.visible_at(viewport.resolution) {
                        continue;
                    }
                    draw::draw_feature(
                        canvas,
                        viewport,
                        style,
                        feature,
                        layer.opacity,
                        &self.cache,
                        self.requests.as_deref(),
                    );
                }
            }
        }
    }

    /// Renders one pass into a fresh surface and encodes it as PNG.
    ///
    /// A convenience terminal operation, not part of the steady-state loop.
    /// Returns `None` instead of failing for a zero-size viewport or an
    /// encoding error.
    pub fn render_to_png(
        &self,
        viewport: &Viewport,
        layers: &[Layer],
        background: Option<Color>,
    ) -> Option<Vec<u8>> {
        let mut pixmap = match Pixmap::new(viewport.width, viewport.height) {
            Some(pixmap) => pixmap,
            None => {
                warn!(
                    width = viewport.width,
                    height = viewport.height,
                    "cannot snapshot a zero-size viewport"
                );
                return None;
            }
        };

        let mut canvas = pixmap.as_mut();
        self.render(&mut canvas, viewport, layers, background);

        match pixmap.encode_png() {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                error!(%err, "failed to encode snapshot");
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchRequest;
    use crate::render::{Feature, Geometry, PolygonRings, RasterSource, WorldExtent, WorldPoint};
    use crate::resource::{Bitmap, ResourceKey};
    use parking_lot::Mutex;

    struct RecordingSink {
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl RequestSink for RecordingSink {
        fn enqueue(&self, request: FetchRequest) -> bool {
            self.requests.lock().push(request);
            true
        }
    }

    fn square_layer() -> Layer {
        let mut layer = Layer::new("squares");
        layer.features.push(Feature::new(Geometry::Polygon(PolygonRings {
            exterior: vec![
                WorldPoint::new(-10.0, -10.0),
                WorldPoint::new(10.0, -10.0),
                WorldPoint::new(10.0, 10.0),
                WorldPoint::new(-10.0, 10.0),
            ],
            interiors: Vec::new(),
        })));
        layer
    }

    fn viewport() -> Viewport {
        Viewport::new(0.0, 0.0, 1.0, 64, 64)
    }

    #[test]
    fn test_pass_advances_iteration_once() {
        let cache = Arc::new(ResourceCache::new());
        let renderer = MapRenderer::new(Arc::clone(&cache));
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        let layers = [square_layer()];

        for expected in 1..=5u64 {
            renderer.render(&mut pixmap.as_mut(), &viewport(), &layers, None);
            assert_eq!(cache.current_iteration(), expected);
        }
    }

    #[test]
    fn test_invalid_viewport_skips_pass() {
        let cache = Arc::new(ResourceCache::new());
        let renderer = MapRenderer::new(Arc::clone(&cache));
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        let bad = Viewport::new(0.0, 0.0, 0.0, 64, 64);

        renderer.render(&mut pixmap.as_mut(), &bad, &[square_layer()], None);
        assert_eq!(cache.current_iteration(), 0);
    }

    #[test]
    fn test_miss_enqueues_without_blocking() {
        let cache = Arc::new(ResourceCache::new());
        let sink = Arc::new(RecordingSink::new());
        let renderer = MapRenderer::with_request_sink(Arc::clone(&cache), sink.clone());
        let mut pixmap = Pixmap::new(64, 64).unwrap();

        let key = ResourceKey::new("tile/5/10/20");
        let mut layer = Layer::new("tiles");
        layer.features.push(Feature::new(Geometry::Raster(RasterSource {
            key: key.clone(),
            extent: WorldExtent::new(-20.0, -20.0, 20.0, 20.0),
        })));

        renderer.render(&mut pixmap.as_mut(), &viewport(), &[layer], None);

        assert_eq!(sink.requests.lock().len(), 1);
        assert_eq!(sink.requests.lock()[0].key, key);
        // The pass still completed.
        assert_eq!(cache.current_iteration(), 1);
    }

    #[test]
    fn test_cached_raster_survives_passes_while_drawn() {
        let cache = Arc::new(ResourceCache::new());
        let renderer = MapRenderer::new(Arc::clone(&cache));
        let mut pixmap = Pixmap::new(64, 64).unwrap();

        let key = ResourceKey::new("tile");
        cache.put(key.clone(), Bitmap::new(Pixmap::new(4, 4).unwrap()));

        let mut layer = Layer::new("tiles");
        layer.features.push(Feature::new(Geometry::Raster(RasterSource {
            key: key.clone(),
            extent: WorldExtent::new(-20.0, -20.0, 20.0, 20.0),
        })));
        let layers = [layer];

        for _ in 0..10 {
            renderer.render(&mut pixmap.as_mut(), &viewport(), &layers, None);
        }
        assert!(cache.try_get(&key).is_some());
    }

    #[test]
    fn test_disabled_layer_is_skipped() {
        let cache = Arc::new(ResourceCache::new());
        let sink = Arc::new(RecordingSink::new());
        let renderer = MapRenderer::with_request_sink(Arc::clone(&cache), sink.clone());
        let mut pixmap = Pixmap::new(64, 64).unwrap();

        let mut layer = Layer::new("tiles");
        layer.enabled = false;
        layer.features.push(Feature::new(Geometry::Raster(RasterSource {
            key: ResourceKey::new("tile"),
            extent: WorldExtent::new(-20.0, -20.0, 20.0, 20.0),
        })));

        renderer.render(&mut pixmap.as_mut(), &viewport(), &[layer], None);
        assert!(sink.requests.lock().is_empty());
    }

    /// A sink that blows up mid-pass, standing in for any panic raised
    /// while iterating features and styles.
    struct PanickingSink;

    impl RequestSink for PanickingSink {
        fn enqueue(&self, _request: FetchRequest) -> bool {
            panic!("sink exploded");
        }
    }

    #[test]
    fn test_panic_mid_pass_abandons_frame_only() {
        let cache = Arc::new(ResourceCache::new());
        let renderer = MapRenderer::with_request_sink(Arc::clone(&cache), Arc::new(PanickingSink));
        let mut pixmap = Pixmap::new(64, 64).unwrap();

        let mut layer = Layer::new("tiles");
        layer.features.push(Feature::new(Geometry::Raster(RasterSource {
            key: ResourceKey::new("tile"),
            extent: WorldExtent::new(-20.0, -20.0, 20.0, 20.0),
        })));

        // The panic is contained at the pass boundary; the frame is
        // abandoned before sweep and advance.
        renderer.render(&mut pixmap.as_mut(), &viewport(), &[layer], None);
        assert_eq!(cache.current_iteration(), 0);

        // The next pass starts cleanly.
        renderer.render(&mut pixmap.as_mut(), &viewport(), &[square_layer()], None);
        assert_eq!(cache.current_iteration(), 1);
    }

    #[test]
    fn test_snapshot_produces_png() {
        let cache = Arc::new(ResourceCache::new());
        let renderer = MapRenderer::new(cache);

        let png = renderer
            .render_to_png(&viewport(), &[square_layer()], Some(Color::WHITE))
            .expect("snapshot bytes");
        // PNG magic.
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_zero_size_snapshot_is_none_not_panic() {
        let cache = Arc::new(ResourceCache::new());
        let renderer = MapRenderer::new(cache);
        let zero = Viewport::new(0.0, 0.0, 1.0, 0, 0);

        assert!(renderer.render_to_png(&zero, &[square_layer()], None).is_none());
    }

    #[test]
    fn test_background_fills_surface() {
        let cache = Arc::new(ResourceCache::new());
        let renderer = MapRenderer::new(cache);
        let mut pixmap = Pixmap::new(8, 8).unwrap();

        renderer.render(
            &mut pixmap.as_mut(),
            &Viewport::new(0.0, 0.0, 1.0, 8, 8),
            &[],
            Some(Color::from_rgba8(1, 2, 3, 255)),
        );

        let pixel = pixmap.pixels()[0];
        assert_eq!(pixel.blue(), 3);
    }
}
