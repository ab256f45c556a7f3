//! Routing between the two render paths.

use proptest::prelude::*;
use texifier::RenderPath;
use texifier::preview::{TABLE_CLOSE, TABLE_OPEN, classify};

#[test]
fn documented_cases() {
    assert_eq!(classify(""), RenderPath::DirectTypeset);
    assert_eq!(classify("\\alpha + \\beta"), RenderPath::DirectTypeset);
    assert_eq!(
        classify("\\begin{tabular}{|c|c|}\\hline a & b \\\\ \\hline\\end{tabular}"),
        RenderPath::ExternalCompile
    );
}

#[test]
fn interior_tables_stay_direct() {
    assert_eq!(
        classify("a \\begin{tabular}{c}x\\end{tabular} b"),
        RenderPath::DirectTypeset
    );
    assert_eq!(
        classify("\\begin{tabular}{c}x\\end{tabular} % done"),
        RenderPath::DirectTypeset
    );
}

proptest! {
    #[test]
    fn total_and_deterministic(text in any::<String>()) {
        prop_assert_eq!(classify(&text), classify(&text));
    }

    #[test]
    fn surrounding_whitespace_is_ignored(
        body in "[a-z &\\\\{}|]{0,20}",
        lead in "[ \t\n]{0,4}",
        trail in "[ \t\n]{0,4}",
    ) {
        let table = format!("{TABLE_OPEN}{body}{TABLE_CLOSE}");
        prop_assert_eq!(classify(&format!("{lead}{table}{trail}")), RenderPath::ExternalCompile);
    }

    #[test]
    fn text_without_open_marker_is_direct(text in "[a-z0-9 +\\\\^_{}]{0,30}") {
        prop_assume!(!text.trim().starts_with(TABLE_OPEN));
        prop_assert_eq!(classify(&text), RenderPath::DirectTypeset);
    }
}
