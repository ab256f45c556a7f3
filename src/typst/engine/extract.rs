//! Frame-tree dump for typeset documents.
//!
//! Math in Typst results in deeply nested frame items (groups + transforms). When a preview
//! looks wrong (misplaced scripts, missing rules), the nesting Typst produced is the first
//! thing to inspect. [`log_paged_document_tree`] writes it to the `trace` log level.
//!
//! The printed format is a debugging aid and not stable.

use std::fmt::Write as _;

use typst::layout::{Frame, FrameItem, PagedDocument, Point};

/// Render the structure of a paged document as an indented tree.
///
/// - `max_depth`: limits recursion depth to keep the output readable.
pub fn describe_paged_document(document: &PagedDocument, max_depth: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "PagedDocument: pages={}, max_depth={}",
        document.pages.len(),
        max_depth
    );

    for (page_idx, page) in document.pages.iter().enumerate() {
        let _ = writeln!(out, "page[{page_idx}]:");
        let frame = &page.frame;
        let _ = writeln!(out, "{}frame: size={:?}", indent(1), frame.size());
        describe_frame(&mut out, frame, 2, max_depth);
    }

    out
}

/// Log the document tree at `trace` level (no-op when trace logging is off).
pub fn log_paged_document_tree(document: &PagedDocument, max_depth: usize) {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("{}", describe_paged_document(document, max_depth));
    }
}

fn describe_frame(out: &mut String, frame: &Frame, depth: usize, max_depth: usize) {
    if depth > max_depth {
        let _ = writeln!(out, "{}<depth limit reached>", indent(depth));
        return;
    }

    let mut count = 0usize;
    for (pos, item) in frame.items() {
        count += 1;
        describe_item(out, *pos, item, depth, max_depth);
    }

    if count == 0 {
        let _ = writeln!(out, "{}<empty frame>", indent(depth));
    }
}

fn describe_item(out: &mut String, pos: Point, item: &FrameItem, depth: usize, max_depth: usize) {
    match item {
        FrameItem::Group(group) => {
            let _ = writeln!(
                out,
                "{}Group @pos={:?} (items={}) transform={:?}",
                indent(depth),
                pos,
                group.frame.items().count(),
                group.transform
            );
            describe_frame(out, &group.frame, depth + 1, max_depth);
        }
        FrameItem::Text(text) => {
            let _ = writeln!(
                out,
                "{}Text @pos={:?} size={:?} glyphs={} text={:?}",
                indent(depth),
                pos,
                text.size,
                text.glyphs.len(),
                text.text
            );
        }
        FrameItem::Shape(shape, _) => {
            let _ = writeln!(
                out,
                "{}Shape @pos={:?} geometry={:?}",
                indent(depth),
                pos,
                shape.geometry
            );
        }
        other => {
            let _ = writeln!(
                out,
                "{}{} @pos={:?}",
                indent(depth),
                frame_item_kind_name(other),
                pos
            );
        }
    }
}

fn frame_item_kind_name(item: &FrameItem) -> &'static str {
    match item {
        FrameItem::Group(_) => "Group",
        FrameItem::Text(_) => "Text",
        FrameItem::Shape(..) => "Shape",
        FrameItem::Image(..) => "Image",
        FrameItem::Link(..) => "Link",
        _ => "Other",
    }
}

fn indent(depth: usize) -> &'static str {
    const INDENTS: [&str; 9] = [
        "",
        "  ",
        "    ",
        "      ",
        "        ",
        "          ",
        "            ",
        "              ",
        "                ",
    ];
    INDENTS[depth.min(INDENTS.len() - 1)]
}
