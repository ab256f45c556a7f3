//! Snippets and the insertion rule.
//!
//! One rule covers every template: splice the template at the cursor, then place the cursor
//! inside the first empty-brace placeholder `{}` if there is one, else after the template.

pub mod palette;

use std::borrow::Cow;

use crate::document::Document;

/// An empty-brace pair marking where the user types next.
pub const PLACEHOLDER: &str = "{}";

/// A palette entry: a display label and the markup it inserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetDefinition {
    pub label: Cow<'static, str>,
    pub template: Cow<'static, str>,
}

/// How a template positions the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateShape {
    Literal,
    SinglePlaceholder,
    MultiPlaceholder(usize),
}

impl SnippetDefinition {
    pub const fn new(label: &'static str, template: &'static str) -> Self {
        Self {
            label: Cow::Borrowed(label),
            template: Cow::Borrowed(template),
        }
    }

    pub fn owned(label: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            label: Cow::Owned(label.into()),
            template: Cow::Owned(template.into()),
        }
    }

    /// Number of non-overlapping `{}` pairs in the template.
    pub fn placeholder_count(&self) -> usize {
        self.template.matches(PLACEHOLDER).count()
    }

    pub fn shape(&self) -> TemplateShape {
        match self.placeholder_count() {
            0 => TemplateShape::Literal,
            1 => TemplateShape::SinglePlaceholder,
            n => TemplateShape::MultiPlaceholder(n),
        }
    }

    /// Char offset of the cursor within the template after insertion.
    fn cursor_offset(&self) -> usize {
        match self.template.find(PLACEHOLDER) {
            Some(byte_idx) => self.template[..byte_idx].chars().count() + 1,
            None => self.template.chars().count(),
        }
    }
}

/// Insert `snippet` at the document cursor and return the new cursor.
///
/// Never fails.
pub fn insert(document: &mut Document, snippet: &SnippetDefinition) -> usize {
    let start = document.cursor();
    document.splice_at_cursor(&snippet.template);
    let cursor = document.set_cursor(start + snippet.cursor_offset());
    log::trace!(
        "inserted {:?} ({:?}) at {start}, cursor -> {cursor}",
        snippet.label,
        snippet.shape()
    );
    cursor
}
