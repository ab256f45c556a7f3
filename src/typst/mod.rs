//! In-process math typesetting (the DirectTypeset backend).
//!
//! Pipeline:
//! 1. Translate delimiter-wrapped math markup into a Typst document ([`latex`]).
//! 2. Compile it against an in-memory world with embedded fonts ([`engine`]).
//! 3. Walk the first page's frame tree into colored triangle meshes ([`render`]).
//! 4. Scan-convert the meshes into an RGBA raster ([`crate::raster`]).
//!
//! Nothing touches the filesystem. The library and fonts are loaded once per
//! [`MathTypesetter`] and shared by every render.

pub mod engine;
pub mod latex;
pub mod render;

use std::sync::Arc;

use anyhow::Context as _;

use crate::config::TypesetOptions;
use crate::preview::{PreviewImage, RenderBackend, RenderError};
use crate::raster;
use crate::scene::Rgba;
use engine::WorldAssets;
use latex::TranslateError;

/// Depth of the frame tree logged at trace level.
const TRACE_TREE_DEPTH: usize = 8;

/// Lays math markup out as centered text and rasterizes it.
pub struct MathTypesetter {
    assets: Arc<WorldAssets>,
    options: TypesetOptions,
}

impl std::fmt::Debug for MathTypesetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MathTypesetter")
            .field("fonts", &self.assets.font_count())
            .field("options", &self.options)
            .finish()
    }
}

impl MathTypesetter {
    /// Load the standard library and fonts.
    pub fn new(options: TypesetOptions) -> anyhow::Result<Self> {
        let assets = WorldAssets::load(options.system_fonts)
            .context("failed to prepare typesetting assets")?;
        log::debug!("typesetter ready with {} font faces", assets.font_count());
        Ok(Self {
            assets: Arc::new(assets),
            options,
        })
    }

    /// The Typst document a wrapped buffer typesets as.
    ///
    /// Every non-blank line becomes its own centered paragraph.
    pub fn typst_source(&self, wrapped: &str) -> Result<String, TranslateError> {
        let opts = &self.options;
        let mut source = format!(
            "#set page(width: auto, height: auto, margin: {}pt, fill: white)\n\
             #set text(size: {}pt)\n\
             #set align(center)\n",
            opts.margin_pt, opts.font_size_pt
        );

        for line in wrapped.lines().map(str::trim).filter(|l| !l.is_empty()) {
            source.push('\n');
            source.push_str(&latex::translate_line(line)?);
            source.push('\n');
        }

        Ok(source)
    }

    /// Typeset `wrapped` and rasterize the first page.
    pub fn render(&self, wrapped: &str) -> Result<PreviewImage, RenderError> {
        let source = self
            .typst_source(wrapped)
            .map_err(|e| RenderError::typeset(e.to_string()))?;
        log::debug!("typst source:\n{source}");

        let document = engine::compile_paged(&source, Arc::clone(&self.assets))
            .map_err(|diag| RenderError::typeset(diag.to_string()))?;

        engine::extract::log_paged_document_tree(&document, TRACE_TREE_DEPTH);

        let page = document
            .pages
            .first()
            .ok_or_else(|| RenderError::typeset("typesetting produced no pages"))?;

        let render_opts = render::RenderOptions {
            tolerance: self.options.tolerance,
            ..Default::default()
        };
        let (items, stats) = render::build_draw_items_from_page(page, &render_opts);
        log::debug!("extracted {} draw items: {stats:?}", items.len());

        let size = page.frame.size();
        let image = raster::rasterize(
            &items,
            [size.x.to_pt() as f32, size.y.to_pt() as f32],
            self.options.pixel_per_pt,
            Rgba::WHITE,
        );
        log::info!("typeset preview {}x{}", image.width(), image.height());
        Ok(image)
    }
}

impl RenderBackend for MathTypesetter {
    fn render(&self, source: &str) -> Result<PreviewImage, RenderError> {
        MathTypesetter::render(self, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::RenderErrorKind;

    fn typesetter() -> MathTypesetter {
        MathTypesetter::new(TypesetOptions {
            system_fonts: false,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn source_has_one_paragraph_per_line() {
        let ts = typesetter();
        let src = ts.typst_source("$a$\n\n$b$\n").unwrap();
        assert!(src.starts_with("#set page("));
        assert!(src.contains("\n$a$\n"));
        assert!(src.contains("\n$b$\n"));
    }

    #[test]
    fn renders_a_symbol() {
        let img = typesetter().render(r"$\alpha$").unwrap();
        assert!(img.width() > 0 && img.height() > 0);
        assert!(!img.is_uniform(), "expected ink on the canvas");
    }

    #[test]
    fn unknown_command_is_a_typeset_failure() {
        let err = typesetter().render(r"$\nosuchthing$").unwrap_err();
        assert_eq!(err.kind, RenderErrorKind::TypesetFailure);
        assert!(err.message.contains("nosuchthing"));
    }
}
