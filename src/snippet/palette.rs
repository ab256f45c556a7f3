//! The static palette: categories of snippets in display order.

use super::SnippetDefinition;

#[derive(Debug)]
pub struct PaletteCategory {
    pub name: &'static str,
    pub snippets: &'static [SnippetDefinition],
}

impl PaletteCategory {
    pub fn find(&self, label: &str) -> Option<&'static SnippetDefinition> {
        self.snippets.iter().find(|s| s.label == label)
    }
}

const fn s(label: &'static str, template: &'static str) -> SnippetDefinition {
    SnippetDefinition::new(label, template)
}

pub static PALETTE: &[PaletteCategory] = &[
    PaletteCategory {
        name: "Symbols",
        snippets: &[
            s("α", "\\alpha"),
            s("β", "\\beta"),
            s("γ", "\\gamma"),
            s("δ", "\\delta"),
            s("√", "\\sqrt{}"),
            s("∫", "\\int"),
            s("∑", "\\sum"),
            s("∞", "\\infty"),
        ],
    },
    PaletteCategory {
        name: "Trig Functions",
        snippets: &[
            s("sin", "\\sin"),
            s("cos", "\\cos"),
            s("tan", "\\tan"),
            s("csc", "\\csc"),
            s("sec", "\\sec"),
            s("cot", "\\cot"),
            s("asin", "\\arcsin"),
            s("acos", "\\arccos"),
            s("atan", "\\arctan"),
        ],
    },
    PaletteCategory {
        name: "Other Functions",
        snippets: &[
            s("log", "\\log"),
            s("ln", "\\ln"),
            s("exp", "\\exp"),
            s("floor", "\\lfloor{}\\rfloor"),
            s("ceil", "\\lceil{}\\rceil"),
        ],
    },
    PaletteCategory {
        name: "Numbers",
        snippets: &[
            s("0", "0"),
            s("1", "1"),
            s("2", "2"),
            s("3", "3"),
            s("4", "4"),
            s("5", "5"),
            s("6", "6"),
            s("7", "7"),
            s("8", "8"),
            s("9", "9"),
        ],
    },
    PaletteCategory {
        name: "Other Constructs",
        snippets: &[s("a/b", "\\frac{}{}"), s("x²", "^{}"), s("x₁", "_{}")],
    },
    PaletteCategory {
        name: "Structures",
        snippets: &[
            s(
                "table 2x2",
                "\\begin{tabular}{|c|c|}\n\\hline\n{} & {} \\\\\n\\hline\n{} & {} \\\\\n\\hline\n\\end{tabular}",
            ),
            s(
                "table 3 cols",
                "\\begin{tabular}{|l|c|r|}\n\\hline\n{} & {} & {} \\\\\n\\hline\n\\end{tabular}",
            ),
        ],
    },
];

pub fn category(name: &str) -> Option<&'static PaletteCategory> {
    PALETTE.iter().find(|c| c.name == name)
}

/// Look up a snippet by category name and label.
pub fn find(category_name: &str, label: &str) -> Option<&'static SnippetDefinition> {
    category(category_name)?.find(label)
}

/// Resolve a `Category/Label` reference. The label may itself contain `/` (as in `a/b`).
pub fn lookup_path(path: &str) -> Option<&'static SnippetDefinition> {
    let (cat, label) = path.split_once('/')?;
    find(cat, label)
}
