//! Typst → colored draw items.
//!
//! Turns a compiled `typst::layout::PagedDocument` page into fill-only triangle meshes the
//! CPU rasterizer consumes. It is **pure** (no pixels here): extraction + tessellation only.
//!
//! Capabilities:
//! - Traverse nested frames (`FrameItem::Group`) while accumulating transforms.
//! - `Geometry::Line` strokes as thin quads (fraction bars, radical vincula).
//! - `Geometry::Rect` / `Geometry::Curve` fills via lyon path tessellation.
//! - Text glyph outlines: for each glyph of a `TextItem`, outline through the font's TTF
//!   face + `ttf-parser`, tessellate via lyon, translate to the pen position.
//! - Glyph mesh caching keyed by (font, glyph id, scale bits).
//!
//! Limitations:
//! - Paint mapping handles solid colors only; gradients/tilings fall back to black.
//! - Curve strokes and images are skipped (math output does not produce them).

use std::collections::HashMap;

use lyon::math::point as lyon_point;
use lyon::path::Path;

use crate::font::tessellate::{self, Affine2x3, TessellateOptions};
use crate::scene::{Affine2, DrawItem2D, Mesh2D, Rgba};
use typst::{
    layout::{Frame, FrameItem, Page, Transform},
    text::TextItem,
    visualize::{CurveItem, Geometry, Paint, Shape},
};

/// Options controlling extraction behavior.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Tessellation tolerance in pt. Smaller => more triangles.
    pub tolerance: f32,

    /// Lower bound for stroked line thickness, so hairlines stay visible after rasterization.
    pub min_line_thickness_pt: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            min_line_thickness_pt: 0.25,
        }
    }
}

/// Basic extraction stats for logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractStats {
    pub groups: usize,
    pub shapes_seen: usize,
    pub texts_seen: usize,

    pub lines_emitted: usize,
    pub filled_shapes_emitted: usize,

    pub glyph_calls: usize,
    pub glyph_triangles: usize,
}

/// Build draw items for one page, in page pt-space (origin top-left, y down).
pub fn build_draw_items_from_page(
    page: &Page,
    opts: &RenderOptions,
) -> (Vec<DrawItem2D>, ExtractStats) {
    let mut out = Vec::new();
    let mut stats = ExtractStats::default();
    let mut cache = GlyphMeshCache::default();

    walk_frame(
        &page.frame,
        Affine2::IDENTITY,
        opts,
        &mut cache,
        &mut out,
        &mut stats,
    );

    (out, stats)
}

fn walk_frame(
    frame: &Frame,
    world_from_frame: Affine2,
    opts: &RenderOptions,
    cache: &mut GlyphMeshCache,
    out: &mut Vec<DrawItem2D>,
    stats: &mut ExtractStats,
) {
    for (pos, item) in frame.items() {
        let world_from_item = world_from_frame.mul(Affine2::translate(
            pos.x.to_pt() as f32,
            pos.y.to_pt() as f32,
        ));

        match item {
            FrameItem::Group(group) => {
                stats.groups += 1;
                // The group transform applies around the group's placement point.
                let world_from_group =
                    world_from_item.mul(affine2_from_typst_transform(group.transform));
                walk_frame(&group.frame, world_from_group, opts, cache, out, stats);
            }

            FrameItem::Shape(shape, _span) => {
                stats.shapes_seen += 1;
                extract_shape(world_from_item, shape, opts, out, stats);
            }

            FrameItem::Text(text) => {
                stats.texts_seen += 1;

                let mut glyph_mesh = Mesh2D::default();
                append_text_glyph_outlines(
                    &mut glyph_mesh,
                    cache,
                    world_from_item,
                    text,
                    opts,
                    stats,
                );
                if !glyph_mesh.is_empty() {
                    out.push(DrawItem2D {
                        mesh: glyph_mesh,
                        fill: paint_to_rgba(&text.fill).unwrap_or(Rgba::BLACK),
                        z: 1,
                    });
                }
            }

            _ => {}
        }
    }
}

/// Map a Typst `Paint` to a scene color (solid colors only).
fn paint_to_rgba(paint: &Paint) -> Option<Rgba> {
    match paint {
        Paint::Solid(c) => {
            let rgba = c.to_rgb();
            Some(Rgba {
                r: rgba.red as f32,
                g: rgba.green as f32,
                b: rgba.blue as f32,
                a: rgba.alpha as f32,
            })
        }
        _ => None,
    }
}

/// Build a lyon path for fillable geometry. Lines have no area and return `None`.
fn path_from_geometry(geometry: &Geometry) -> Option<Path> {
    match geometry {
        Geometry::Rect(size) => Some(tessellate::rect_path(
            size.x.to_pt() as f32,
            size.y.to_pt() as f32,
        )),
        Geometry::Curve(curve) => {
            let mut b = Path::builder();
            let mut started = false;
            let pt = |p: &typst::layout::Point| lyon_point(p.x.to_pt() as f32, p.y.to_pt() as f32);

            for item in curve.0.iter() {
                match item {
                    CurveItem::Move(p) => {
                        if started {
                            b.close();
                        }
                        b.begin(pt(p));
                        started = true;
                    }
                    CurveItem::Line(p) => {
                        if !started {
                            b.begin(lyon_point(0.0, 0.0));
                            started = true;
                        }
                        b.line_to(pt(p));
                    }
                    CurveItem::Cubic(p1, p2, p) => {
                        if !started {
                            b.begin(lyon_point(0.0, 0.0));
                            started = true;
                        }
                        b.cubic_bezier_to(pt(p1), pt(p2), pt(p));
                    }
                    CurveItem::Close => {
                        if started {
                            b.close();
                            started = false;
                        }
                    }
                }
            }

            if started {
                b.close();
            }
            Some(b.build())
        }
        _ => None,
    }
}

/// Extract a shape into colored draw items: fill first, then stroke-only lines.
fn extract_shape(
    world_from_item: Affine2,
    shape: &Shape,
    opts: &RenderOptions,
    out: &mut Vec<DrawItem2D>,
    stats: &mut ExtractStats,
) {
    if let (Some(fill), Some(path)) = (
        shape.fill.as_ref().and_then(paint_to_rgba),
        path_from_geometry(&shape.geometry),
    ) {
        let mut mesh = Mesh2D::default();
        let xf = affine2x3_from_scene(world_from_item);
        let res = tessellate::append_tessellated_path(
            &mut mesh,
            &path,
            xf,
            TessellateOptions {
                tolerance: opts.tolerance,
                ..Default::default()
            },
        );
        if let Err(err) = res {
            log::debug!("skipping shape fill: {err}");
        } else if !mesh.is_empty() {
            out.push(DrawItem2D {
                mesh,
                fill,
                z: 0,
            });
            stats.filled_shapes_emitted += 1;
        }
    }

    if let (Geometry::Line(delta), Some(stroke)) = (&shape.geometry, shape.stroke.as_ref()) {
        let color = paint_to_rgba(&stroke.paint).unwrap_or(Rgba::BLACK);
        let thickness_pt = (stroke.thickness.to_pt() as f32).max(opts.min_line_thickness_pt);

        let (x0, y0) = world_from_item.transform_point(0.0, 0.0);
        let (x1, y1) =
            world_from_item.transform_point(delta.x.to_pt() as f32, delta.y.to_pt() as f32);

        let mut mesh = Mesh2D::default();
        append_line_as_rect(&mut mesh, [x0, y0], [x1, y1], thickness_pt);
        if !mesh.is_empty() {
            out.push(DrawItem2D {
                mesh,
                fill: color,
                z: 0,
            });
            stats.lines_emitted += 1;
        }
    }
}

/// Extract and append tessellated glyph outlines for a shaped Typst `TextItem`.
///
/// Glyph outlines are y-up in font units; page space is y-down, so the font-unit scale
/// flips y.
fn append_text_glyph_outlines(
    dst: &mut Mesh2D,
    cache: &mut GlyphMeshCache,
    world_from_item: Affine2,
    text: &TextItem,
    opts: &RenderOptions,
    stats: &mut ExtractStats,
) {
    let face = text.font.ttf();
    let upm = face.units_per_em() as f32;
    if upm <= 0.0 {
        return;
    }

    let units_to_pt = (text.size.to_pt() as f32) / upm;
    let world_from_item_2x3 = affine2x3_from_scene(world_from_item);

    let mut pen_x_pt = 0.0f32;

    for g in text.glyphs.iter() {
        stats.glyph_calls += 1;

        let adv_pt = g.x_advance.at(text.size).to_pt() as f32;
        let x_off_pt = g.x_offset.at(text.size).to_pt() as f32;
        let y_off_pt = g.y_offset.at(text.size).to_pt() as f32;

        let key = GlyphCacheKey {
            font: text.font.clone(),
            glyph_id: g.id,
            scale_bits: units_to_pt.to_bits(),
        };

        let cached = cache.get_or_insert_with(key, || {
            let mut builder = LyonOutlineBuilder::new();
            face.outline_glyph(ttf_parser::GlyphId(g.id), &mut builder)?;
            let path = builder.build();
            tessellate::tessellate_path_to_mesh(
                &path,
                Affine2x3::scale_translate(units_to_pt, -units_to_pt, 0.0, 0.0),
                TessellateOptions {
                    tolerance: opts.tolerance,
                    ..Default::default()
                },
            )
            .ok()
        });

        if let Some(src) = cached {
            // Typst's y offset points up (like font units).
            let translate = Affine2x3::scale_translate(1.0, 1.0, pen_x_pt + x_off_pt, -y_off_pt);
            let xf = world_from_item_2x3.mul(translate);

            let before = dst.indices.len();
            match tessellate::append_mesh_with_transform(dst, src, xf) {
                Ok(()) => stats.glyph_triangles += (dst.indices.len() - before) / 3,
                Err(err) => log::debug!("dropping glyph {}: {err}", g.id),
            }
        }

        pen_x_pt += adv_pt;
    }
}

/// Convert `scene::Affine2` into tessellator `Affine2x3`.
fn affine2x3_from_scene(xf: Affine2) -> Affine2x3 {
    Affine2x3 {
        a: xf.m[0][0],
        b: xf.m[0][1],
        c: xf.m[1][0],
        d: xf.m[1][1],
        tx: xf.m[2][0],
        ty: xf.m[2][1],
    }
}

/// Glyph cache key: font face + glyph ID + scale bits.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct GlyphCacheKey {
    font: typst::text::Font,
    glyph_id: u16,
    scale_bits: u32,
}

/// Cache for tessellated glyph meshes (scaled to pt, no translation).
#[derive(Debug, Default)]
struct GlyphMeshCache {
    inner: HashMap<GlyphCacheKey, Option<Mesh2D>>,
}

impl GlyphMeshCache {
    fn get_or_insert_with(
        &mut self,
        key: GlyphCacheKey,
        f: impl FnOnce() -> Option<Mesh2D>,
    ) -> Option<&Mesh2D> {
        self.inner.entry(key).or_insert_with(f).as_ref()
    }
}

/// Convert `ttf-parser` outline callbacks into a `lyon::path::Path`.
struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    contour_open: bool,
}

impl LyonOutlineBuilder {
    fn new() -> Self {
        Self {
            builder: Path::builder(),
            contour_open: false,
        }
    }

    fn build(mut self) -> Path {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(lyon_point(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(lyon_point(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder
            .quadratic_bezier_to(lyon_point(x1, y1), lyon_point(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder
            .cubic_bezier_to(lyon_point(x1, y1), lyon_point(x2, y2), lyon_point(x, y));
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}

/// Convert Typst `Transform` into our `scene::Affine2`.
fn affine2_from_typst_transform(t: Transform) -> Affine2 {
    let sx = t.sx.get() as f32;
    let sy = t.sy.get() as f32;
    let kx = t.kx.get() as f32;
    let ky = t.ky.get() as f32;
    let tx = t.tx.to_pt() as f32;
    let ty = t.ty.to_pt() as f32;

    Affine2 {
        m: [[sx, ky, 0.0], [kx, sy, 0.0], [tx, ty, 1.0]],
    }
}

/// Append a line segment as a thin rectangle mesh (two triangles).
fn append_line_as_rect(mesh: &mut Mesh2D, a: [f32; 2], b: [f32; 2], thickness_pt: f32) {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len = (dx * dx + dy * dy).sqrt();

    if len < 1e-6 || mesh.positions.len() + 4 > u16::MAX as usize {
        return;
    }

    let nx = -dy / len;
    let ny = dx / len;
    let half = 0.5 * thickness_pt;

    let p0 = [a[0] + nx * half, a[1] + ny * half];
    let p1 = [a[0] - nx * half, a[1] - ny * half];
    let p2 = [b[0] - nx * half, b[1] - ny * half];
    let p3 = [b[0] + nx * half, b[1] + ny * half];

    let base = mesh.positions.len() as u16;
    mesh.positions.extend_from_slice(&[p0, p1, p2, p3]);
    mesh.indices
        .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_quad_spans_segment_with_thickness() {
        let mut mesh = Mesh2D::default();
        append_line_as_rect(&mut mesh, [0.0, 10.0], [20.0, 10.0], 2.0);
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, [0.0, 9.0]);
        assert_eq!(bounds.max, [20.0, 11.0]);
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn degenerate_line_emits_nothing() {
        let mut mesh = Mesh2D::default();
        append_line_as_rect(&mut mesh, [3.0, 3.0], [3.0, 3.0], 1.0);
        assert!(mesh.is_empty());
    }

    #[test]
    fn outline_builder_closes_open_contours() {
        use ttf_parser::OutlineBuilder as _;

        let mut b = LyonOutlineBuilder::new();
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.line_to(10.0, 10.0);
        b.move_to(20.0, 0.0);
        b.line_to(30.0, 0.0);
        b.line_to(30.0, 10.0);
        let path = b.build();

        let mesh = tessellate::tessellate_path_to_mesh(
            &path,
            Affine2x3::IDENTITY,
            TessellateOptions::default(),
        )
        .unwrap();
        assert_eq!(mesh.indices.len(), 6);
    }
}
