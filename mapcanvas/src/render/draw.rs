//! Per-variant draw routines.
//!
//! One routine per geometry kind, dispatched with a single `match` in
//! [`draw_feature`]. Bitmap-backed variants (rasters, point symbols) look
//! their resource up in the cache; a miss enqueues a fetch request and draws
//! nothing this pass; the render thread never waits for a decode.

use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, PixmapMut, PixmapPaint, Transform,
};

use crate::fetch::{FetchRequest, RequestSink};
use crate::render::{Feature, Geometry, PolygonRings, RasterSource, Style, Viewport, WorldPoint};
use crate::resource::ResourceCache;

/// Draws one feature with one style.
pub(crate) fn draw_feature(
    canvas: &mut PixmapMut<'_>,
    viewport: &Viewport,
    style: &Style,
    feature: &Feature,
    layer_opacity: f32,
    cache: &ResourceCache,
    requests: Option<&dyn RequestSink>,
) {
    let opacity = (layer_opacity * style.opacity).clamp(0.0, 1.0);
    match &feature.geometry {
        Geometry::Point(point) => {
            draw_point(canvas, viewport, style, *point, opacity, cache, requests)
        }
        Geometry::MultiPoint(points) => {
            for point in points {
                draw_point(canvas, viewport, style, *point, opacity, cache, requests);
            }
        }
        Geometry::LineString(line) => draw_line_string(canvas, viewport, style, line, opacity),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                draw_line_string(canvas, viewport, style, line, opacity);
            }
        }
        Geometry::Polygon(rings) => draw_polygon(canvas, viewport, style, rings, opacity),
        Geometry::MultiPolygon(polygons) => {
            for rings in polygons {
                draw_polygon(canvas, viewport, style, rings, opacity);
            }
        }
        Geometry::Raster(raster) => draw_raster(canvas, viewport, raster, opacity, cache, requests),
    }
}

fn with_opacity(color: Color, opacity: f32) -> Color {
    Color::from_rgba(
        color.red(),
        color.green(),
        color.blue(),
        (color.alpha() * opacity).clamp(0.0, 1.0),
    )
    .unwrap_or(color)
}

fn solid_paint(color: Color, opacity: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(with_opacity(color, opacity));
    paint.anti_alias = true;
    paint
}

fn bitmap_paint(opacity: f32) -> PixmapPaint {
    PixmapPaint {
        opacity,
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    }
}

fn draw_point(
    canvas: &mut PixmapMut<'_>,
    viewport: &Viewport,
    style: &Style,
    point: WorldPoint,
    opacity: f32,
    cache: &ResourceCache,
    requests: Option<&dyn RequestSink>,
) {
    let (sx, sy) = viewport.world_to_screen(point.x, point.y);

    if let Some(key) = &style.symbol {
        if let Some(resource) = cache.try_get(key) {
            let bitmap = resource.image;
            let scale = style.symbol_scale.max(0.0);
            let half_w = bitmap.width() as f32 * scale / 2.0;
            let half_h = bitmap.height() as f32 * scale / 2.0;
            let transform =
                Transform::from_translate(sx - half_w, sy - half_h).pre_scale(scale, scale);
            canvas.draw_pixmap(
                0,
                0,
                bitmap.as_pixmap_ref(),
                &bitmap_paint(opacity),
                transform,
                None,
            );
            return;
        }
        if let Some(sink) = requests {
            sink.enqueue(FetchRequest::on_demand(key.clone()));
        }
        // Symbol not decoded yet: fall through to the circle placeholder.
    }

    if let Some(fill) = style.fill {
        let mut pb = PathBuilder::new();
        pb.push_circle(sx, sy, style.point_radius);
        if let Some(path) = pb.finish() {
            canvas.fill_path(
                &path,
                &solid_paint(fill, opacity),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

fn draw_line_string(
    canvas: &mut PixmapMut<'_>,
    viewport: &Viewport,
    style: &Style,
    line: &[WorldPoint],
    opacity: f32,
) {
    let Some(stroke) = &style.stroke else {
        return;
    };
    if line.len() < 2 {
        return;
    }

    let mut pb = PathBuilder::new();
    let (x0, y0) = viewport.world_to_screen(line[0].x, line[0].y);
    pb.move_to(x0, y0);
    for point in &line[1..] {
        let (x, y) = viewport.world_to_screen(point.x, point.y);
        pb.line_to(x, y);
    }

    if let Some(path) = pb.finish() {
        let sk_stroke = tiny_skia::Stroke {
            width: stroke.width,
            ..tiny_skia::Stroke::default()
        };
        canvas.stroke_path(
            &path,
            &solid_paint(stroke.color, opacity),
            &sk_stroke,
            Transform::identity(),
            None,
        );
    }
}

fn draw_polygon(
    canvas: &mut PixmapMut<'_>,
    viewport: &Viewport,
    style: &Style,
    rings: &PolygonRings,
    opacity: f32,
) {
    if rings.exterior.len() < 3 {
        return;
    }

    let mut pb = PathBuilder::new();
    add_ring(&mut pb, viewport, &rings.exterior);
    for hole in &rings.interiors {
        if hole.len() >= 3 {
            add_ring(&mut pb, viewport, hole);
        }
    }
    let Some(path) = pb.finish() else {
        return;
    };

    if let Some(fill) = style.fill {
        canvas.fill_path(
            &path,
            &solid_paint(fill, opacity),
            FillRule::EvenOdd,
            Transform::identity(),
            None,
        );
    }
    if let Some(stroke) = &style.stroke {
        let sk_stroke = tiny_skia::Stroke {
            width: stroke.width,
            ..tiny_skia::Stroke::default()
        };
        canvas.stroke_path(
            &path,
            &solid_paint(stroke.color, opacity),
            &sk_stroke,
            Transform::identity(),
            None,
        );
    }
}

fn add_ring(pb: &mut PathBuilder, viewport: &Viewport, ring: &[WorldPoint]) {
    let (x0, y0) = viewport.world_to_screen(ring[0].x, ring[0].y);
    pb.move_to(x0, y0);
    for point in &ring[1..] {
        let (x, y) = viewport.world_to_screen(point.x, point.y);
        pb.line_to(x, y);
    }
    pb.close();
}

fn draw_raster(
    canvas: &mut PixmapMut<'_>,
    viewport: &Viewport,
    raster: &RasterSource,
    opacity: f32,
    cache: &ResourceCache,
    requests: Option<&dyn RequestSink>,
) {
    let Some(rect) = viewport.screen_rect(&raster.extent) else {
        return;
    };

    match cache.try_get(&raster.key) {
        Some(resource) => {
            let bitmap = resource.image;
            let scale_x = rect.width() / bitmap.width() as f32;
            let scale_y = rect.height() / bitmap.height() as f32;
            let transform = Transform::from_row(scale_x, 0.0, 0.0, scale_y, rect.x(), rect.y());
            canvas.draw_pixmap(
                0,
                0,
                bitmap.as_pixmap_ref(),
                &bitmap_paint(opacity),
                transform,
                None,
            );
        }
        None => {
            // No image this pass; the decoded tile will be there later.
            if let Some(sink) = requests {
                sink.enqueue(FetchRequest::on_demand(raster.key.clone()));
            }
        }
    }
}
