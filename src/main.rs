//! Thin binary wrapper around the `texifier` library.
//!
//! Run:
//! - `cargo run -- palette`
//! - `cargo run -- compose @Symbols/α " + " "@Other Constructs/a/b" 1 --render out.png`
//! - `echo '\alpha^2' | cargo run -- render --output out.png`

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use texifier::snippet::{self, palette};
use texifier::{Document, PreviewConfig};

#[derive(Debug, Parser)]
#[command(name = "texifier")]
#[command(about = "Compose LaTeX math from a snippet palette and render previews", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    render: RenderFlags,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List palette categories and their snippets
    Palette,
    /// Build a buffer from palette items and typed text
    Compose {
        /// `@Category/Label` activates a snippet; anything else is typed at the cursor
        #[arg(required = true)]
        items: Vec<String>,
        /// Save the buffer (a `.tex` extension is added if missing)
        #[arg(long)]
        save: Option<PathBuf>,
        /// Render the buffer to this PNG file
        #[arg(long)]
        render: Option<PathBuf>,
    },
    /// Render a buffer read from a file or stdin
    Render {
        /// Input file; stdin when absent or `-`
        input: Option<PathBuf>,
        /// PNG file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Overrides on top of the `TEXIFIER_*` environment.
#[derive(Debug, Args)]
struct RenderFlags {
    /// LaTeX compiler for tabular content
    #[arg(long, global = true)]
    latex: Option<String>,
    /// PDF rasterizer (pdftoppm-compatible)
    #[arg(long, global = true)]
    pdftoppm: Option<String>,
    /// Subprocess timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Typeset font size in pt
    #[arg(long, global = true)]
    font_size: Option<f32>,
    /// Skip system fonts (embedded fonts only)
    #[arg(long, global = true)]
    no_system_fonts: bool,
}

impl RenderFlags {
    fn config(&self) -> PreviewConfig {
        let mut config = PreviewConfig::from_env();
        if let Some(latex) = &self.latex {
            config.compiler.program = latex.clone();
        }
        if let Some(pdftoppm) = &self.pdftoppm {
            config.compiler.converter = pdftoppm.clone();
        }
        if let Some(secs) = self.timeout_secs.filter(|s| *s > 0) {
            config.compiler.timeout = Duration::from_secs(secs);
        }
        if let Some(size) = self.font_size.filter(|s| *s > 0.0) {
            config.typeset.font_size_pt = size;
        }
        if self.no_system_fonts {
            config.typeset.system_fonts = false;
        }
        config
    }
}

/// Exit status for a render that failed with a user-facing message.
const RENDER_FAILED: u8 = 2;

fn main() -> anyhow::Result<ExitCode> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Palette => {
            print_palette();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compose {
            items,
            save,
            render,
        } => compose(&items, save.as_deref(), render.as_deref(), &cli.render),
        Commands::Render { input, output } => {
            let text = read_input(input.as_deref())?;
            render_to(&text, &output, &cli.render)
        }
    }
}

fn print_palette() {
    for category in palette::PALETTE {
        println!("{}", category.name);
        for s in category.snippets {
            println!("  {:<14} {}", s.label, s.template.escape_debug());
        }
    }
}

fn compose(
    items: &[String],
    save: Option<&Path>,
    render: Option<&Path>,
    flags: &RenderFlags,
) -> anyhow::Result<ExitCode> {
    let mut doc = Document::new();
    for item in items {
        match item.strip_prefix('@') {
            Some(path) => {
                let def = palette::lookup_path(path)
                    .with_context(|| format!("no palette snippet {path:?}"))?;
                snippet::insert(&mut doc, def);
            }
            None => {
                doc.insert_str(item);
            }
        }
    }

    println!("{}", doc.text());
    println!("cursor: {}", doc.cursor());

    if let Some(path) = save {
        let written = doc
            .save(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        println!("saved {}", written.display());
    }
    match render {
        Some(output) => render_to(&doc.snapshot(), output, flags),
        None => Ok(ExitCode::SUCCESS),
    }
}

fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Render `text` to a PNG. A render failure is reported on stderr and turned into a
/// non-zero exit status; only I/O and setup problems are errors.
fn render_to(text: &str, output: &Path, flags: &RenderFlags) -> anyhow::Result<ExitCode> {
    let renderer = texifier::default_renderer(&flags.config())?;
    match renderer.render(&Document::from_text(text)) {
        Ok(image) => {
            image
                .write_png(output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "wrote {} ({}x{})",
                output.display(),
                image.width(),
                image.height()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::from(RENDER_FAILED))
        }
    }
}
