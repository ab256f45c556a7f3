//! Minimal Typst `World` for typesetting one in-memory preview source.
//!
//! - The standard library and the font set are built once ([`WorldAssets`]) and shared by
//!   every world through an `Arc`, so repeated previews do not re-scan system fonts.
//! - Each render gets a fresh [`TypstWorld`] holding only its source text.
//! - No file imports, no packages, no binary assets.
//!
//! Fonts:
//! - The embedded `typst-assets` fonts are always loaded first. They include the default
//!   math font, which keeps output identical on machines with different system fonts.
//! - System fonts discovered through `fontdb` are appended when enabled.
//!
//! `typst` wants `font(index)` to stay consistent with the indices in the `FontBook`, so the
//! book is built from the exact `fonts` vector it indexes into.

use std::{fs, path::PathBuf, sync::Arc};

use ecow::EcoString;
use fontdb::{Database, Source as FontSource};
use typst::{
    Library, LibraryExt,
    diag::{FileError, FileResult},
    foundations::{Bytes, Datetime},
    syntax::{FileId, Source as TypstSource, VirtualPath},
    text::{Font, FontBook},
    utils::LazyHash,
};

/// In-memory main source document.
#[derive(Debug, Clone)]
pub struct InMemoryDoc {
    /// Virtual file path for diagnostics.
    pub main_path: EcoString,
    /// Typst source contents.
    pub main_source: EcoString,
}

impl InMemoryDoc {
    pub fn new(main_path: impl Into<EcoString>, main_source: impl Into<EcoString>) -> Self {
        Self {
            main_path: main_path.into(),
            main_source: main_source.into(),
        }
    }
}

/// Library + fonts shared by all worlds.
pub struct WorldAssets {
    library: LazyHash<Library>,
    book: LazyHash<FontBook>,
    /// Loaded fonts in the exact order used by `font(index)`.
    fonts: Vec<Font>,
}

impl WorldAssets {
    /// Load the standard library and fonts.
    ///
    /// `system_fonts` additionally scans the host's font directories.
    pub fn load(system_fonts: bool) -> anyhow::Result<Self> {
        let mut fonts = load_embedded_fonts();
        let embedded = fonts.len();
        if system_fonts {
            fonts.extend(load_system_fonts());
        }

        if fonts.is_empty() {
            anyhow::bail!("no fonts could be loaded (typst-assets + system fonts)");
        }

        log::debug!(
            "typst world assets: {} embedded font(s), {} system font(s)",
            embedded,
            fonts.len() - embedded
        );

        let book = FontBook::from_fonts(fonts.iter());

        Ok(Self {
            library: LazyHash::new(Library::default()),
            book: LazyHash::new(book),
            fonts,
        })
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }
}

/// Fonts embedded in `typst-assets`.
fn load_embedded_fonts() -> Vec<Font> {
    typst_assets::fonts()
        .flat_map(|data| Font::iter(Bytes::new(data)))
        .collect()
}

/// File-backed system fonts discovered via `fontdb`. Unreadable or unparsable faces are
/// skipped.
fn load_system_fonts() -> Vec<Font> {
    let mut db = Database::new();
    db.load_system_fonts();

    let mut fonts = Vec::new();
    // Faces of one collection file share a path; read each file once.
    let mut last: Option<(PathBuf, Bytes)> = None;

    for face in db.faces() {
        let FontSource::File(path) = &face.source else {
            continue;
        };

        let bytes = match &last {
            Some((p, b)) if p == path => b.clone(),
            _ => match fs::read(path) {
                Ok(data) => {
                    let owned: Arc<[u8]> = Arc::from(data);
                    let b = Bytes::new(owned);
                    last = Some((path.clone(), b.clone()));
                    b
                }
                Err(err) => {
                    log::trace!("skipping font {}: {err}", path.display());
                    continue;
                }
            },
        };

        if let Some(font) = Font::new(bytes, face.index) {
            fonts.push(font);
        }
    }

    fonts
}

/// A single-source Typst world backed by shared [`WorldAssets`].
pub struct TypstWorld {
    doc: InMemoryDoc,
    main: FileId,
    assets: Arc<WorldAssets>,
}

impl TypstWorld {
    pub fn new(doc: InMemoryDoc, assets: Arc<WorldAssets>) -> Self {
        let main = FileId::new(None, VirtualPath::new(doc.main_path.as_str()));
        Self { doc, main, assets }
    }
}

impl typst::World for TypstWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.assets.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.assets.book
    }

    fn main(&self) -> FileId {
        self.main
    }

    fn source(&self, id: FileId) -> FileResult<TypstSource> {
        if id == self.main {
            Ok(TypstSource::new(id, self.doc.main_source.to_string()))
        } else {
            Err(FileError::NotFound(PathBuf::from("<memory>")))
        }
    }

    fn file(&self, _id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(PathBuf::from("<memory>")))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.assets.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        // Keeps compilation deterministic; previews never print dates.
        None
    }
}
