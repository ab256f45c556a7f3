//! Glyph/path tessellation helpers.
//!
//! Converts vector outlines (`lyon::path::Path`) into triangle meshes
//! (`crate::scene::Mesh2D`) using `lyon::tessellation::FillTessellator`.
//!
//! Typical flow for glyphs:
//! 1. Extract the glyph outline as a `Path` in font units.
//! 2. Tessellate with a transform from font units to pt (y flipped, since outlines are y-up
//!    and page space is y-down).
//! 3. Append into a batch mesh and translate to the pen position.
//!
//! Fill rule matters: fonts are usually authored for non-zero winding.

use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, FillVertexConstructor,
    VertexBuffers,
};

use crate::scene::Mesh2D;

/// Tessellation options tailored for glyph outlines.
///
/// - `tolerance`: smaller => more triangles (smoother curves), larger => fewer triangles.
/// - `fill_rule`: NonZero is a common default for fonts; EvenOdd can be useful in some cases.
#[derive(Debug, Copy, Clone)]
pub struct TessellateOptions {
    pub tolerance: f32,
    pub fill_rule: FillRule,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            fill_rule: FillRule::NonZero,
        }
    }
}

/// Simple affine transform for 2D points (column-vector convention).
///
/// Matrix:
/// [ a c tx ]
/// [ b d ty ]
/// [ 0 0  1 ]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2x3 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine2x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2x3 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub fn scale_translate(sx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            tx,
            ty,
        }
    }

    /// `self * rhs`: `rhs` applies first.
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            tx: self.a * rhs.tx + self.c * rhs.ty + self.tx,
            ty: self.b * rhs.tx + self.d * rhs.ty + self.ty,
        }
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let nx = self.a * x + self.c * y + self.tx;
        let ny = self.b * x + self.d * y + self.ty;
        (nx, ny)
    }
}

/// Builds output positions from lyon's `FillVertex`, applying the transform.
struct PositionCtor {
    xf: Affine2x3,
}

impl FillVertexConstructor<[f32; 2]> for PositionCtor {
    fn new_vertex(&mut self, v: FillVertex) -> [f32; 2] {
        let p = v.position();
        let (x, y) = self.xf.transform_point(p.x, p.y);
        [x, y]
    }
}

/// Tessellate a single outline path into a `Mesh2D`.
///
/// Errors:
/// - Returns `Err(String)` if tessellation fails (e.g. invalid path data).
pub fn tessellate_path_to_mesh(
    path: &Path,
    transform: Affine2x3,
    opts: TessellateOptions,
) -> Result<Mesh2D, String> {
    let mut tess = FillTessellator::new();
    let mut buffers: VertexBuffers<[f32; 2], u16> = VertexBuffers::new();

    let fill = FillOptions::tolerance(opts.tolerance).with_fill_rule(opts.fill_rule);

    // Fonts can have self-intersections; keep lyon's defaults for correctness.
    let ctor = PositionCtor { xf: transform };
    tess.tessellate_path(path, &fill, &mut BuffersBuilder::new(&mut buffers, ctor))
        .map_err(|e| format!("lyon tessellation failed: {e:?}"))?;

    Ok(Mesh2D {
        positions: buffers.vertices,
        indices: buffers.indices,
    })
}

/// Tessellate `path` and append it into `out`, offsetting indices.
pub fn append_tessellated_path(
    out: &mut Mesh2D,
    path: &Path,
    transform: Affine2x3,
    opts: TessellateOptions,
) -> Result<(), String> {
    let mesh = tessellate_path_to_mesh(path, transform, opts)?;
    append_mesh_with_transform(out, &mesh, Affine2x3::IDENTITY)
}

/// Append `src` into `dst` after transforming its positions by `xf`.
///
/// Fails without touching `dst` if the combined vertex count would overflow u16 indices.
pub fn append_mesh_with_transform(
    dst: &mut Mesh2D,
    src: &Mesh2D,
    xf: Affine2x3,
) -> Result<(), String> {
    let base = dst.positions.len();
    if base + src.positions.len() > u16::MAX as usize {
        return Err(format!(
            "mesh vertex count overflow for u16 indices ({} + {})",
            base,
            src.positions.len()
        ));
    }

    dst.positions.extend(src.positions.iter().map(|p| {
        let (x, y) = xf.transform_point(p[0], p[1]);
        [x, y]
    }));

    let base_u16 = base as u16;
    dst.indices
        .extend(src.indices.iter().copied().map(|i| base_u16 + i));
    Ok(())
}

/// An axis-aligned rectangle path with its top-left corner at the origin.
pub fn rect_path(w: f32, h: f32) -> Path {
    let mut b = Path::builder();
    b.begin(point(0.0, 0.0));
    b.line_to(point(w, 0.0));
    b.line_to(point(w, h));
    b.line_to(point(0.0, h));
    b.close();
    b.build()
}
