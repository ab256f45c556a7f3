//! Preview pipeline configuration.
//!
//! Defaults are usable as-is; [`PreviewConfig::from_env`] layers environment overrides on
//! top, and the binary layers its flags on top of that.

use std::path::PathBuf;
use std::time::Duration;

pub const ENV_LATEX: &str = "TEXIFIER_LATEX";
pub const ENV_PDFTOPPM: &str = "TEXIFIER_PDFTOPPM";
pub const ENV_TIMEOUT_SECS: &str = "TEXIFIER_TIMEOUT_SECS";
pub const ENV_WORK_DIR: &str = "TEXIFIER_WORK_DIR";

#[derive(Debug, Clone, Default)]
pub struct PreviewConfig {
    pub typeset: TypesetOptions,
    pub compiler: CompilerConfig,
}

/// Settings for the in-process math typesetter.
#[derive(Debug, Clone)]
pub struct TypesetOptions {
    pub font_size_pt: f32,
    /// Raster resolution.
    pub pixel_per_pt: f32,
    /// Blank space around the formula, in pt.
    pub margin_pt: f32,
    /// Also offer installed fonts to the typesetter (the embedded set is always loaded).
    pub system_fonts: bool,
    /// Outline tessellation tolerance in pt.
    pub tolerance: f32,
}

impl Default for TypesetOptions {
    fn default() -> Self {
        Self {
            font_size_pt: 20.0,
            pixel_per_pt: 2.0,
            margin_pt: 8.0,
            system_fonts: true,
            tolerance: 0.02,
        }
    }
}

/// Settings for the external document compiler round trip.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// LaTeX compiler executable.
    pub program: String,
    /// Arguments passed before the source file path.
    pub args: Vec<String>,
    /// PDF → PNG converter executable (poppler's `pdftoppm` command line).
    pub converter: String,
    pub resolution_dpi: u32,
    /// Upper bound for each subprocess.
    pub timeout: Duration,
    /// Parent directory for working areas; the system temp dir when `None`.
    pub work_root: Option<PathBuf>,
    /// Crop the page raster to its content.
    pub trim_margins: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "pdflatex".to_string(),
            args: vec![
                "-interaction=nonstopmode".to_string(),
                "-halt-on-error".to_string(),
            ],
            converter: "pdftoppm".to_string(),
            resolution_dpi: 150,
            timeout: Duration::from_secs(30),
            work_root: None,
            trim_margins: true,
        }
    }
}

impl PreviewConfig {
    /// Defaults with `TEXIFIER_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from `lookup` (environment-shaped: key → value).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(program) = non_empty(ENV_LATEX) {
            self.compiler.program = program;
        }
        if let Some(converter) = non_empty(ENV_PDFTOPPM) {
            self.compiler.converter = converter;
        }
        if let Some(dir) = non_empty(ENV_WORK_DIR) {
            self.compiler.work_root = Some(PathBuf::from(dir));
        }
        if let Some(raw) = non_empty(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.compiler.timeout = Duration::from_secs(secs),
                _ => log::warn!("ignoring {ENV_TIMEOUT_SECS}={raw:?}: expected a positive integer"),
            }
        }
    }
}
