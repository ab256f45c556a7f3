//! `texifier` library crate root.
//!
//! Palette-driven math authoring: snippets are spliced into a [`document::Document`] by the
//! insertion rule in [`snippet`], and [`preview::PreviewRenderer`] turns the buffer into a
//! raster, either by typesetting math in-process ([`typst::MathTypesetter`]) or by running an
//! external LaTeX compiler for tabular content ([`compile::DocumentCompiler`]).
//!
//! The binary target stays thin; it only parses flags, sets up logging and calls in here.

pub mod compile;
pub mod config;
pub mod document;
pub mod font;
pub mod preview;
pub mod raster;
pub mod scene;
pub mod snippet;
pub mod typst;

pub use config::PreviewConfig;
pub use document::Document;
pub use preview::{PreviewImage, PreviewRenderer, RenderError, RenderErrorKind, RenderPath};
pub use snippet::{SnippetDefinition, insert};

/// The renderer wired to the real backends.
pub type DefaultRenderer = PreviewRenderer<crate::typst::MathTypesetter, compile::DocumentCompiler>;

/// Build the default renderer for `config`.
///
/// Fails only if the typesetter cannot load its fonts. Logging is left to the caller.
pub fn default_renderer(config: &PreviewConfig) -> anyhow::Result<DefaultRenderer> {
    let math = crate::typst::MathTypesetter::new(config.typeset.clone())?;
    let compiler = compile::DocumentCompiler::new(config.compiler.clone());
    Ok(PreviewRenderer::new(math, compiler))
}
