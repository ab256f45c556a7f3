//! The editable buffer: text plus a cursor.
//!
//! Text is stored in a [`ropey::Rope`]; the cursor is a **char** offset, so it can never
//! split a multi-byte character. `0 <= cursor <= len_chars()` holds after every operation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ropey::Rope;

/// Extension given to saved buffers.
pub const SAVE_EXTENSION: &str = "tex";

#[derive(Debug, Clone, Default)]
pub struct Document {
    text: Rope,
    cursor: usize,
}

impl Document {
    /// An empty buffer with the cursor at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer holding `text`, cursor at the end.
    pub fn from_text(text: &str) -> Self {
        let text = Rope::from_str(text);
        let cursor = text.len_chars();
        Self { text, cursor }
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    /// Move the cursor, clamped to `[0, len_chars()]`. Returns the resulting offset.
    pub fn set_cursor(&mut self, offset: usize) -> usize {
        self.cursor = offset.min(self.text.len_chars());
        self.cursor
    }

    /// Move the cursor by `delta` chars, clamped at both ends.
    pub fn move_cursor(&mut self, delta: isize) -> usize {
        let target = self.cursor.saturating_add_signed(delta);
        self.set_cursor(target)
    }

    /// Insert `s` at the cursor without moving it.
    pub(crate) fn splice_at_cursor(&mut self, s: &str) {
        self.text.insert(self.cursor, s);
    }

    /// Type `s` at the cursor; the cursor ends up after it.
    pub fn insert_str(&mut self, s: &str) -> usize {
        self.splice_at_cursor(s);
        self.cursor += s.chars().count();
        self.cursor
    }

    /// A copy of the text, detached from later edits.
    pub fn snapshot(&self) -> String {
        self.text()
    }

    /// Write the text verbatim (UTF-8) to `path`, adding a `.tex` extension if it has none.
    /// Returns the path written.
    pub fn save(&self, path: &Path) -> io::Result<PathBuf> {
        let path = with_save_extension(path);
        let mut file = io::BufWriter::new(fs::File::create(&path)?);
        self.text.write_to(&mut file)?;
        io::Write::flush(&mut file)?;
        log::debug!("saved {} chars to {}", self.len_chars(), path.display());
        Ok(path)
    }
}

fn with_save_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == SAVE_EXTENSION => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(SAVE_EXTENSION);
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_advances_cursor_in_chars() {
        let mut doc = Document::new();
        assert_eq!(doc.insert_str("αβ"), 2);
        doc.set_cursor(1);
        doc.insert_str("x");
        assert_eq!(doc.text(), "αxβ");
        assert_eq!(doc.cursor(), 2);
    }

    #[test]
    fn cursor_is_clamped() {
        let mut doc = Document::from_text("abc");
        assert_eq!(doc.set_cursor(99), 3);
        assert_eq!(doc.move_cursor(-10), 0);
        assert_eq!(doc.move_cursor(2), 2);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut doc = Document::from_text("a");
        let snap = doc.snapshot();
        doc.insert_str("b");
        assert_eq!(snap, "a");
    }

    #[test]
    fn save_adds_extension_and_writes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::from_text("\\frac{a}{b}\n  x ");

        let written = doc.save(&dir.path().join("formula")).unwrap();
        assert_eq!(written, dir.path().join("formula.tex"));
        assert_eq!(fs::read_to_string(&written).unwrap(), "\\frac{a}{b}\n  x ");

        let kept = doc.save(&dir.path().join("other.tex")).unwrap();
        assert_eq!(kept, dir.path().join("other.tex"));

        let appended = doc.save(&dir.path().join("notes.txt")).unwrap();
        assert_eq!(appended, dir.path().join("notes.txt.tex"));
    }
}
