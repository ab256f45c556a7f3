//! External document compilation (the ExternalCompile backend).
//!
//! One render:
//! 1. create a [`WorkingArea`],
//! 2. write the content wrapped in [`DOCUMENT_TEMPLATE`] to `preview.tex`,
//! 3. run the LaTeX compiler on it,
//! 4. rasterize page 1 of `preview.pdf` with the converter,
//! 5. decode the PNG.
//!
//! The working area is dropped on every path out of [`DocumentCompiler::render`], so no file
//! outlives the call.

pub mod toolchain;
pub mod workspace;

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::config::CompilerConfig;
use crate::preview::{PreviewImage, RenderBackend, RenderError};
use toolchain::{RunError, ToolOutput, extract_diagnostics, run_with_timeout};
pub use workspace::WorkingArea;

pub const SOURCE_FILE: &str = "preview.tex";
pub const OUTPUT_FILE: &str = "preview.pdf";
/// Converter output prefix; the converter appends `.png`.
pub const PAGE_PREFIX: &str = "page";

const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
/// Pixels kept around trimmed content.
const TRIM_PADDING: u32 = 12;

/// Minimal document wrapped around the raw content; `{content}` is replaced.
pub const DOCUMENT_TEMPLATE: &str = "\\documentclass{article}
\\usepackage{amsmath}
\\usepackage{amssymb}
\\pagestyle{empty}
\\begin{document}
{content}
\\end{document}
";

/// The full source for `content`.
pub fn document_source(content: &str) -> String {
    DOCUMENT_TEMPLATE.replacen("{content}", content, 1)
}

#[derive(Debug, Clone, Default)]
pub struct DocumentCompiler {
    config: CompilerConfig,
}

impl DocumentCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Compile `content` and return its first page as an image.
    pub fn render(&self, content: &str) -> Result<PreviewImage, RenderError> {
        let area = WorkingArea::create(self.config.work_root.as_deref())
            .map_err(|e| RenderError::compile(format!("cannot create working area: {e}")))?;

        let result = self.render_in(area.path(), content);
        drop(area);

        if let Ok(image) = &result {
            log::info!("compiled preview {}x{}", image.width(), image.height());
        }
        result
    }

    fn render_in(&self, dir: &Path, content: &str) -> Result<PreviewImage, RenderError> {
        let source = dir.join(SOURCE_FILE);
        fs::write(&source, document_source(content))
            .map_err(|e| RenderError::compile(format!("cannot write {SOURCE_FILE}: {e}")))?;

        self.run_compiler(dir, &source)?;

        let pdf = dir.join(OUTPUT_FILE);
        if !pdf.is_file() {
            return Err(RenderError::compile(format!(
                "`{}` produced no {OUTPUT_FILE}",
                self.config.program
            )));
        }

        let image = self.convert_first_page(dir, &pdf)?;
        Ok(if self.config.trim_margins {
            image.trimmed(BACKGROUND, TRIM_PADDING)
        } else {
            image
        })
    }

    fn run_compiler(&self, dir: &Path, source: &Path) -> Result<(), RenderError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args).arg(source).current_dir(dir);

        let output = run_with_timeout(&mut cmd, self.config.timeout).map_err(|err| match err {
            RunError::Spawn { .. } if err.is_not_found() => RenderError::toolchain_unavailable(
                format!(
                    "`{}` not found; install a LaTeX distribution or set TEXIFIER_LATEX",
                    self.config.program
                ),
            ),
            RunError::Spawn { .. } => RenderError::toolchain_unavailable(err.to_string()),
            RunError::TimedOut { .. } | RunError::Wait { .. } => {
                RenderError::compile(err.to_string())
            }
        })?;

        if output.status.success() {
            return Ok(());
        }
        Err(RenderError::compile(failure_message(
            &self.config.program,
            &output,
        )))
    }

    fn convert_first_page(&self, dir: &Path, pdf: &Path) -> Result<PreviewImage, RenderError> {
        let prefix = dir.join(PAGE_PREFIX);
        let mut cmd = Command::new(&self.config.converter);
        cmd.arg("-png")
            .arg("-r")
            .arg(self.config.resolution_dpi.to_string())
            .args(["-f", "1", "-l", "1", "-singlefile"])
            .arg(pdf)
            .arg(&prefix)
            .current_dir(dir);

        let output = run_with_timeout(&mut cmd, self.config.timeout)
            .map_err(|err| RenderError::conversion(err.to_string()))?;
        if !output.status.success() {
            return Err(RenderError::conversion(failure_message(
                &self.config.converter,
                &output,
            )));
        }

        let png = prefix.with_extension("png");
        let decoded = image::open(&png)
            .map_err(|e| RenderError::conversion(format!("cannot read {}: {e}", png.display())))?;
        Ok(PreviewImage::from_dynamic(decoded))
    }
}

fn failure_message(program: &str, output: &ToolOutput) -> String {
    let diag = extract_diagnostics(&output.combined());
    if diag.is_empty() {
        format!("`{program}` exited with {}", output.status)
    } else {
        diag
    }
}

impl RenderBackend for DocumentCompiler {
    fn render(&self, source: &str) -> Result<PreviewImage, RenderError> {
        DocumentCompiler::render(self, source)
    }
}
