//! CPU rasterization of fill-only draw items.
//!
//! The typesetting stage emits triangle meshes in pt-space; this module scan-converts them
//! into an RGBA canvas. Coverage is estimated with a regular `SAMPLES` x `SAMPLES` grid per
//! pixel. Samples are collected into a per-item mask before blending, so triangles of the
//! same item that share an edge do not double-blend along it.
//!
//! The [`Canvas`] is an owned value: it is consumed into a [`PreviewImage`] or dropped on
//! every exit path, never stored.

use crate::preview::PreviewImage;
use crate::scene::{Affine2, DrawItem2D, Rgba};

/// Samples per pixel along each axis.
pub const SAMPLES: usize = 4;

/// An RGBA8 drawing surface.
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A canvas of at least 1x1 pixels filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let px = background.to_rgba8();
        let pixels = px
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill one draw item laid out in pt, scaled by `pixel_per_pt`.
    pub fn fill_item(&mut self, item: &DrawItem2D, pixel_per_pt: f32) {
        let bounds = item.mesh.bounds();
        if bounds.is_empty() || item.fill.a <= 0.0 {
            return;
        }

        let x0 = ((bounds.min[0] * pixel_per_pt).floor().max(0.0) as u32).min(self.width);
        let y0 = ((bounds.min[1] * pixel_per_pt).floor().max(0.0) as u32).min(self.height);
        let x1 = ((bounds.max[0] * pixel_per_pt).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((bounds.max[1] * pixel_per_pt).ceil().max(0.0) as u32).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let px_from_pt = Affine2::scale(pixel_per_pt, pixel_per_pt);
        let tris: Vec<[[f32; 2]; 3]> = item
            .mesh
            .triangles()
            .map(|tri| {
                tri.map(|[x, y]| {
                    let (px, py) = px_from_pt.transform_point(x, y);
                    [px, py]
                })
            })
            .collect();

        let mask_w = (x1 - x0) as usize * SAMPLES;
        let mask_h = (y1 - y0) as usize * SAMPLES;
        let mut mask = vec![false; mask_w * mask_h];
        let step = 1.0 / SAMPLES as f32;

        for tri in &tris {
            mark_triangle(&mut mask, mask_w, mask_h, [x0 as f32, y0 as f32], step, tri);
        }

        let color = item.fill.to_rgba8();
        for py in 0..(y1 - y0) as usize {
            for px in 0..(x1 - x0) as usize {
                let mut hits = 0usize;
                for sy in 0..SAMPLES {
                    let row = (py * SAMPLES + sy) * mask_w + px * SAMPLES;
                    hits += mask[row..row + SAMPLES].iter().filter(|&&m| m).count();
                }
                if hits == 0 {
                    continue;
                }
                let coverage = hits as f32 / (SAMPLES * SAMPLES) as f32 * item.fill.a;
                self.blend(x0 + px as u32, y0 + py as u32, color, coverage);
            }
        }
    }

    /// Source-over blend of `color` at `coverage` into one pixel.
    fn blend(&mut self, x: u32, y: u32, color: [u8; 4], coverage: f32) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let dst = &mut self.pixels[idx..idx + 4];
        for c in 0..3 {
            let v = color[c] as f32 * coverage + dst[c] as f32 * (1.0 - coverage);
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        let a = 255.0 * coverage + dst[3] as f32 * (1.0 - coverage);
        dst[3] = a.round().clamp(0.0, 255.0) as u8;
    }

    pub fn into_image(self) -> PreviewImage {
        PreviewImage::from_parts(self.width, self.height, self.pixels)
    }
}

/// Mark every mask sample whose center lies inside `tri` (pixel coordinates).
fn mark_triangle(
    mask: &mut [bool],
    mask_w: usize,
    mask_h: usize,
    origin: [f32; 2],
    step: f32,
    tri: &[[f32; 2]; 3],
) {
    let [a, b, c] = *tri;
    let area = edge(a, b, c);
    if area.abs() < f32::EPSILON {
        return;
    }

    let min_x = a[0].min(b[0]).min(c[0]);
    let max_x = a[0].max(b[0]).max(c[0]);
    let min_y = a[1].min(b[1]).min(c[1]);
    let max_y = a[1].max(b[1]).max(c[1]);

    let to_sample = |v: f32, o: f32| ((v - o) / step - 0.5).max(0.0);
    let sx0 = to_sample(min_x, origin[0]).floor() as usize;
    let sy0 = to_sample(min_y, origin[1]).floor() as usize;
    let sx1 = (to_sample(max_x, origin[0]).ceil() as usize + 1).min(mask_w);
    let sy1 = (to_sample(max_y, origin[1]).ceil() as usize + 1).min(mask_h);

    for sy in sy0..sy1 {
        let y = origin[1] + (sy as f32 + 0.5) * step;
        for sx in sx0..sx1 {
            let x = origin[0] + (sx as f32 + 0.5) * step;
            let p = [x, y];
            let w0 = edge(b, c, p);
            let w1 = edge(c, a, p);
            let w2 = edge(a, b, p);
            let inside = if area > 0.0 {
                w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
            } else {
                w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
            };
            if inside {
                mask[sy * mask_w + sx] = true;
            }
        }
    }
}

#[inline]
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

/// Rasterize draw items laid out on a page of `size_pt`, scaled by `pixel_per_pt`.
///
/// Items are painted in ascending `z`, preserving emission order within a layer.
pub fn rasterize(
    items: &[DrawItem2D],
    size_pt: [f32; 2],
    pixel_per_pt: f32,
    background: Rgba,
) -> PreviewImage {
    let width = (size_pt[0] * pixel_per_pt).ceil().max(1.0) as u32;
    let height = (size_pt[1] * pixel_per_pt).ceil().max(1.0) as u32;

    let mut canvas = Canvas::new(width, height, background);

    let mut order: Vec<&DrawItem2D> = items.iter().collect();
    order.sort_by_key(|item| item.z);
    for item in order {
        canvas.fill_item(item, pixel_per_pt);
    }

    canvas.into_image()
}
