//! In-process typesetting through the full pipeline.

use std::sync::OnceLock;

use texifier::compile::DocumentCompiler;
use texifier::config::{CompilerConfig, TypesetOptions};
use texifier::typst::MathTypesetter;
use texifier::{Document, PreviewRenderer, RenderErrorKind};

/// Font loading is the slow part; share one typesetter across tests.
fn typesetter() -> &'static MathTypesetter {
    static TYPESETTER: OnceLock<MathTypesetter> = OnceLock::new();
    TYPESETTER.get_or_init(|| {
        MathTypesetter::new(TypesetOptions {
            system_fonts: false,
            ..Default::default()
        })
        .unwrap()
    })
}

fn renderer() -> PreviewRenderer<&'static MathTypesetter, DocumentCompiler> {
    // The compiler must never be reached by these tests.
    let compiler = DocumentCompiler::new(CompilerConfig {
        program: "texifier-test-no-compiler".to_string(),
        ..Default::default()
    });
    PreviewRenderer::new(typesetter(), compiler)
}

#[test]
fn alpha_renders_with_ink() {
    let image = renderer().render(&Document::from_text("\\alpha")).unwrap();
    assert!(image.width() > 0 && image.height() > 0);
    assert!(!image.is_uniform());
}

#[test]
fn blank_buffers_are_empty_input() {
    for text in ["", "   ", "\n\t\n"] {
        let err = renderer().render(&Document::from_text(text)).unwrap_err();
        assert_eq!(err.kind, RenderErrorKind::EmptyInput, "{text:?}");
    }
}

#[test]
fn rendering_is_idempotent() {
    let doc = Document::from_text("\\sum_{n=1}^{\\infty} \\frac{1}{n^2}");
    let r = renderer();
    let first = r.render(&doc).unwrap();
    let second = r.render(&doc).unwrap();
    assert_eq!(first, second);
}

#[test]
fn more_lines_make_a_taller_image() {
    let r = renderer();
    let one = r.render(&Document::from_text("x^{2}")).unwrap();
    let two = r.render(&Document::from_text("x^{2}\n\ny_{1}")).unwrap();
    assert!(two.height() > one.height());
}

#[test]
fn palette_output_typesets() {
    let r = renderer();
    for text in [
        "\\lfloor{x}\\rfloor + \\lceil{y}\\rceil",
        "\\sin\\theta \\cdot \\arctan{x}",
        "\\sqrt{\\gamma} + \\int_{0}^{1} \\ln x",
        "\\frac{}{}",
    ] {
        r.render(&Document::from_text(text))
            .unwrap_or_else(|e| panic!("{text:?}: {e}"));
    }
}

#[test]
fn malformed_markup_is_a_typeset_failure() {
    let r = renderer();
    for text in ["\\frac{1}{", "\\unknowncommand", "x}"] {
        let err = r.render(&Document::from_text(text)).unwrap_err();
        assert_eq!(err.kind, RenderErrorKind::TypesetFailure, "{text:?}");
        assert!(!err.message.is_empty());
    }
}

#[test]
fn png_export_decodes_to_same_size() {
    let image = renderer().render(&Document::from_text("\\beta")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beta.png");
    image.write_png(&path).unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (image.width(), image.height()));
}
