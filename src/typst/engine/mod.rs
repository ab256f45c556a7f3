//! Typst engine integration.
//!
//! This module is responsible for:
//! - owning the shared world assets (standard library + fonts)
//! - compiling an in-memory Typst source into a `PagedDocument`
//! - turning Typst diagnostics into a readable message
//!
//! Compilation failures are reported as [`CompileDiagnostics`] so callers can surface the
//! messages to the user without digging through Typst types.

pub mod extract;
pub mod world;

use std::sync::Arc;

use ecow::EcoString;
use typst::layout::PagedDocument;

pub use world::{InMemoryDoc, TypstWorld, WorldAssets};

/// Virtual path used for preview sources in diagnostics.
pub const PREVIEW_MAIN_PATH: &str = "/preview.typ";

/// Error messages reported by a failed Typst compilation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("typst compile failed: {}", .messages.join("; "))]
pub struct CompileDiagnostics {
    pub messages: Vec<EcoString>,
}

/// Compile `source` against the shared `assets` into a paged document.
pub fn compile_paged(
    source: &str,
    assets: Arc<WorldAssets>,
) -> Result<PagedDocument, CompileDiagnostics> {
    let world = TypstWorld::new(InMemoryDoc::new(PREVIEW_MAIN_PATH, source), assets);
    let warned = typst::compile::<PagedDocument>(&world);

    for warning in &warned.warnings {
        log::debug!("typst warning: {}", warning.message);
    }

    warned.output.map_err(|errs| CompileDiagnostics {
        messages: errs.iter().map(|diag| diag.message.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> Arc<WorldAssets> {
        Arc::new(WorldAssets::load(false).unwrap())
    }

    #[test]
    fn compiles_inline_math() {
        let doc = compile_paged("#set page(width: auto, height: auto)\n$x^2$", assets()).unwrap();
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn errors_carry_typst_messages() {
        let err = compile_paged("#undefined-thing", assets()).unwrap_err();
        assert!(!err.messages.is_empty());
        let text = err.to_string();
        assert!(text.starts_with("typst compile failed: "), "{text}");
        assert!(text.contains("undefined"), "{text}");
    }
}
