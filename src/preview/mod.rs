//! Preview pipeline: classify the buffer, pick a backend, return a raster or a typed error.

pub mod error;
pub mod image;

pub use error::{RenderError, RenderErrorKind, RenderOutcome};
pub use image::PreviewImage;

use crate::document::Document;

/// Opening marker of a structured table.
pub const TABLE_OPEN: &str = "\\begin{tabular}";
/// Closing marker of a structured table.
pub const TABLE_CLOSE: &str = "\\end{tabular}";

/// Which backend renders a buffer. Decided per render, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    DirectTypeset,
    ExternalCompile,
}

/// Route a buffer: a whole-buffer tabular block goes to the external compiler, anything
/// else is typeset directly. Total and pure.
pub fn classify(text: &str) -> RenderPath {
    let trimmed = text.trim();
    if trimmed.starts_with(TABLE_OPEN) && trimmed.ends_with(TABLE_CLOSE) {
        RenderPath::ExternalCompile
    } else {
        RenderPath::DirectTypeset
    }
}

/// Wrap each non-blank line in `$...$`, trimmed, joined by `\n`. Blank lines are dropped.
pub fn wrap_math_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("${line}$"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Something that turns source text into a preview image.
pub trait RenderBackend {
    fn render(&self, source: &str) -> Result<PreviewImage, RenderError>;
}

impl<T: RenderBackend + ?Sized> RenderBackend for &T {
    fn render(&self, source: &str) -> Result<PreviewImage, RenderError> {
        (**self).render(source)
    }
}

/// Drives one render: classification, wrapping, and dispatch to the matching backend.
///
/// Backend errors are returned unchanged.
#[derive(Debug)]
pub struct PreviewRenderer<M, C> {
    math: M,
    compiler: C,
}

impl<M: RenderBackend, C: RenderBackend> PreviewRenderer<M, C> {
    pub fn new(math: M, compiler: C) -> Self {
        Self { math, compiler }
    }

    pub fn math(&self) -> &M {
        &self.math
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn render(&self, document: &Document) -> RenderOutcome {
        self.render_text(&document.snapshot())
    }

    pub fn render_text(&self, text: &str) -> RenderOutcome {
        let text = text.trim();
        if text.is_empty() {
            return Err(RenderError::empty_input());
        }

        let path = classify(text);
        log::debug!("render path: {path:?}");
        match path {
            RenderPath::DirectTypeset => self.math.render(&wrap_math_lines(text)),
            RenderPath::ExternalCompile => self.compiler.render(text),
        }
    }
}
