//! Outline geometry helpers.
//!
//! Glyph outlines come out of `ttf-parser` as paths; [`tessellate`] turns those paths (and
//! rule/rect geometry) into triangle meshes for the rasterizer.

pub mod tessellate;
