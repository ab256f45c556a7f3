//! The external-compile path against fake toolchains.
//!
//! Shell scripts stand in for `pdflatex` and `pdftoppm`, so these tests run without a TeX
//! installation and can assert on exactly what the compiler left behind.
//!
//! The scripts are written once, before any test spawns a process: executing a file that
//! another thread's forked child still holds open for writing fails with `ETXTBSY`.
//! They run inside `<fixture>/work/<area>`, so `../..` is the calling test's fixture dir.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use tempfile::TempDir;
use texifier::compile::DocumentCompiler;
use texifier::config::CompilerConfig;
use texifier::preview::RenderBackend;
use texifier::{Document, PreviewImage, PreviewRenderer, RenderError, RenderErrorKind};

const TABLE: &str = "\\begin{tabular}{|c|c|}\n\\hline\na & b \\\\\n\\hline\n\\end{tabular}";

/// File names inside a fixture dir, as seen from the working area.
const LOG: &str = "latex.log";
const PNG: &str = "page-fixture.png";

const SCRIPTS: &[(&str, &str)] = &[
    // Writes `<source>.pdf` next to the source and records its arguments and input.
    (
        "good-latex",
        r#"#!/bin/sh
for last; do :; done
echo "$@" >> ../../latex.log
cp "$last" ../../latex.log.source
printf '%%PDF-1.4 fake\n' > "${last%.tex}.pdf"
echo "Output written on preview.pdf (1 page)."
exit 0
"#,
    ),
    // Fails the way pdflatex does on an undefined command.
    (
        "failing-latex",
        r#"#!/bin/sh
for last; do :; done
printf 'junk\n' > "${last%.tex}.log"
echo "This is pdfTeX, Version 3.14"
echo "! Undefined control sequence."
echo "l.7 a & b"
exit 1
"#,
    ),
    // Exits cleanly without producing a PDF.
    ("silent-latex", "#!/bin/sh\nexit 0\n"),
    ("slow-latex", "#!/bin/sh\nexec sleep 30\n"),
    // Copies the fixture PNG to `<prefix>.png`.
    (
        "good-pdftoppm",
        "#!/bin/sh\nfor last; do :; done\ncp ../../page-fixture.png \"$last.png\"\n",
    ),
    (
        "failing-pdftoppm",
        "#!/bin/sh\necho 'Syntax Error: bad xref table' >&2\nexit 99\n",
    ),
    // Writes garbage instead of a PNG.
    (
        "garbage-pdftoppm",
        "#!/bin/sh\nfor last; do :; done\necho nope > \"$last.png\"\n",
    ),
    ("slow-pdftoppm", "#!/bin/sh\nexec sleep 30\n"),
];

fn script_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("texifier-fake-toolchain");
        fs::create_dir_all(&dir).unwrap();
        for (name, body) in SCRIPTS {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    })
}

fn script(name: &str) -> String {
    script_dir().join(name).to_string_lossy().into_owned()
}

struct Fixture {
    dir: TempDir,
    work_root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        // Scripts must exist before this test forks anything.
        script_dir();

        let dir = tempfile::tempdir().unwrap();
        let work_root = dir.path().join("work");
        fs::create_dir_all(&work_root).unwrap();

        // A white page with a black block in the middle.
        let (w, h) = (60u32, 40u32);
        let mut pixels = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                let ink = (20..40).contains(&x) && (15..25).contains(&y);
                pixels.extend_from_slice(if ink { &[0, 0, 0, 255] } else { &[255, 255, 255, 255] });
            }
        }
        PreviewImage::from_rgba8(w, h, pixels)
            .unwrap()
            .write_png(&dir.path().join(PNG))
            .unwrap();

        Self { dir, work_root }
    }

    fn config(&self, latex: &str, pdftoppm: &str) -> CompilerConfig {
        CompilerConfig {
            program: script(latex),
            converter: script(pdftoppm),
            timeout: Duration::from_secs(20),
            work_root: Some(self.work_root.clone()),
            ..Default::default()
        }
    }

    fn compiler(&self, latex: &str, pdftoppm: &str) -> DocumentCompiler {
        DocumentCompiler::new(self.config(latex, pdftoppm))
    }

    fn log(&self) -> PathBuf {
        self.dir.path().join(LOG)
    }

    fn assert_work_root_empty(&self) {
        let left: Vec<_> = fs::read_dir(&self.work_root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert!(left.is_empty(), "working area left behind: {left:?}");
    }
}

#[test]
fn success_returns_trimmed_page_and_cleans_up() {
    let fx = Fixture::new();
    let compiler = fx.compiler("good-latex", "good-pdftoppm");

    let image = compiler.render(TABLE).unwrap();
    // 20x10 block plus 12px padding on each side, clamped to the page.
    assert_eq!((image.width(), image.height()), (44, 34));
    fx.assert_work_root_empty();

    let args = fs::read_to_string(fx.log()).unwrap();
    assert!(args.contains("-interaction=nonstopmode"));
    assert!(args.trim_end().ends_with("preview.tex"));

    let source = fs::read_to_string(fx.dir.path().join("latex.log.source")).unwrap();
    assert!(source.starts_with("\\documentclass{article}"));
    assert!(source.contains(TABLE));
    assert!(source.trim_end().ends_with("\\end{document}"));
}

#[test]
fn untrimmed_page_keeps_full_size() {
    let fx = Fixture::new();
    let compiler = DocumentCompiler::new(CompilerConfig {
        trim_margins: false,
        ..fx.config("good-latex", "good-pdftoppm")
    });
    let image = compiler.render(TABLE).unwrap();
    assert_eq!((image.width(), image.height()), (60, 40));
}

#[test]
fn nonzero_exit_is_compile_failure_with_diagnostics() {
    let fx = Fixture::new();
    let compiler = fx.compiler("failing-latex", "good-pdftoppm");

    let err = compiler.render(TABLE).unwrap_err();
    assert_eq!(err.kind, RenderErrorKind::CompileFailure);
    assert!(err.message.contains("! Undefined control sequence."), "{}", err.message);
    assert!(err.message.contains("l.7"), "{}", err.message);
    assert!(!err.message.contains("pdfTeX"), "{}", err.message);
    fx.assert_work_root_empty();
}

#[test]
fn missing_output_is_compile_failure() {
    let fx = Fixture::new();
    let err = fx.compiler("silent-latex", "good-pdftoppm").render(TABLE).unwrap_err();
    assert_eq!(err.kind, RenderErrorKind::CompileFailure);
    assert!(err.message.contains("preview.pdf"));
    fx.assert_work_root_empty();
}

#[test]
fn missing_toolchain_is_unavailable() {
    let fx = Fixture::new();
    let compiler = DocumentCompiler::new(CompilerConfig {
        program: script("no-such-latex"),
        ..fx.config("good-latex", "good-pdftoppm")
    });
    let err = compiler.render(TABLE).unwrap_err();
    assert_eq!(err.kind, RenderErrorKind::ToolchainUnavailable);
    assert!(err.message.contains("not found"), "{}", err.message);
    fx.assert_work_root_empty();
}

#[test]
fn converter_failures_are_conversion_failures() {
    let fx = Fixture::new();
    for pdftoppm in ["failing-pdftoppm", "garbage-pdftoppm", "no-such-pdftoppm"] {
        let err = fx.compiler("good-latex", pdftoppm).render(TABLE).unwrap_err();
        assert_eq!(err.kind, RenderErrorKind::ConversionFailure, "{pdftoppm}: {err}");
        fx.assert_work_root_empty();
    }
}

#[test]
fn hung_compiler_times_out_as_compile_failure() {
    let fx = Fixture::new();
    let compiler = DocumentCompiler::new(CompilerConfig {
        timeout: Duration::from_millis(300),
        ..fx.config("slow-latex", "good-pdftoppm")
    });
    let err = compiler.render(TABLE).unwrap_err();
    assert_eq!(err.kind, RenderErrorKind::CompileFailure);
    assert!(err.message.contains("did not finish"), "{}", err.message);
    fx.assert_work_root_empty();
}

#[test]
fn hung_converter_times_out_as_conversion_failure() {
    let fx = Fixture::new();
    let compiler = DocumentCompiler::new(CompilerConfig {
        timeout: Duration::from_millis(300),
        ..fx.config("good-latex", "slow-pdftoppm")
    });
    let err = compiler.render(TABLE).unwrap_err();
    assert_eq!(err.kind, RenderErrorKind::ConversionFailure);
    assert!(err.message.contains("did not finish"), "{}", err.message);
    fx.assert_work_root_empty();
}

#[test]
fn pipeline_routes_tables_to_compiler_once() {
    struct NoMath;
    impl RenderBackend for NoMath {
        fn render(&self, _: &str) -> Result<PreviewImage, RenderError> {
            panic!("tables must not be typeset directly");
        }
    }

    let fx = Fixture::new();
    let renderer = PreviewRenderer::new(NoMath, fx.compiler("good-latex", "good-pdftoppm"));
    let doc = Document::from_text(&format!("\n  {TABLE}\n"));
    renderer.render(&doc).unwrap();

    let calls = fs::read_to_string(fx.log()).unwrap();
    assert_eq!(calls.lines().count(), 1);
    fx.assert_work_root_empty();
}
