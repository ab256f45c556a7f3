//! LaTeX-style math markup → Typst math.
//!
//! The palette inserts LaTeX commands (`\alpha`, `\frac{}{}`, `^{}`), while the in-process
//! typesetter speaks Typst math. This module bridges the two for the subset of markup a
//! formula preview needs: symbols, operator names, fractions, roots, scripts, delimiters,
//! spacing, text and a handful of font/accent commands.
//!
//! It is a translator, not a validator: anything outside that subset is reported as an
//! error so the preview can say what it could not typeset.
//!
//! Output conventions:
//! - Symbols are emitted as Unicode characters (no reliance on Typst identifiers).
//! - Output atoms are separated by spaces, so adjacent letters never fuse into a Typst
//!   identifier and ASCII shorthands like `->` never form by accident.
//! - Empty arguments become `""` (empty text), keeping calls like `frac("", "")` valid.

use thiserror::Error;

/// Why a piece of markup could not be translated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("unsupported command \\{0}")]
    UnknownCommand(String),
    #[error("unbalanced braces")]
    UnbalancedBraces,
    #[error("unbalanced brackets in optional argument")]
    UnbalancedBrackets,
    #[error("\\{0} is missing an argument")]
    MissingArgument(String),
    #[error("unbalanced math delimiters in {0:?}")]
    UnbalancedDelimiters(String),
}

/// Command name → Unicode symbol.
const SYMBOLS: &[(&str, &str)] = &[
    // Greek, lowercase
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ϵ"),
    ("varepsilon", "ε"),
    ("zeta", "ζ"),
    ("eta", "η"),
    ("theta", "θ"),
    ("vartheta", "ϑ"),
    ("iota", "ι"),
    ("kappa", "κ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("nu", "ν"),
    ("xi", "ξ"),
    ("pi", "π"),
    ("varpi", "ϖ"),
    ("rho", "ρ"),
    ("varrho", "ϱ"),
    ("sigma", "σ"),
    ("varsigma", "ς"),
    ("tau", "τ"),
    ("upsilon", "υ"),
    ("phi", "ϕ"),
    ("varphi", "φ"),
    ("chi", "χ"),
    ("psi", "ψ"),
    ("omega", "ω"),
    // Greek, uppercase
    ("Gamma", "Γ"),
    ("Delta", "Δ"),
    ("Theta", "Θ"),
    ("Lambda", "Λ"),
    ("Xi", "Ξ"),
    ("Pi", "Π"),
    ("Sigma", "Σ"),
    ("Upsilon", "Υ"),
    ("Phi", "Φ"),
    ("Psi", "Ψ"),
    ("Omega", "Ω"),
    // Big operators
    ("sum", "∑"),
    ("prod", "∏"),
    ("coprod", "∐"),
    ("int", "∫"),
    ("iint", "∬"),
    ("iiint", "∭"),
    ("oint", "∮"),
    ("bigcup", "⋃"),
    ("bigcap", "⋂"),
    // Binary operators and relations
    ("cdot", "⋅"),
    ("times", "×"),
    ("div", "÷"),
    ("pm", "±"),
    ("mp", "∓"),
    ("ast", "∗"),
    ("circ", "∘"),
    ("bullet", "∙"),
    ("oplus", "⊕"),
    ("otimes", "⊗"),
    ("cup", "∪"),
    ("cap", "∩"),
    ("setminus", "∖"),
    ("wedge", "∧"),
    ("land", "∧"),
    ("vee", "∨"),
    ("lor", "∨"),
    ("neg", "¬"),
    ("lnot", "¬"),
    ("le", "≤"),
    ("leq", "≤"),
    ("ge", "≥"),
    ("geq", "≥"),
    ("ne", "≠"),
    ("neq", "≠"),
    ("ll", "≪"),
    ("gg", "≫"),
    ("approx", "≈"),
    ("equiv", "≡"),
    ("sim", "∼"),
    ("simeq", "≃"),
    ("cong", "≅"),
    ("propto", "∝"),
    ("in", "∈"),
    ("notin", "∉"),
    ("ni", "∋"),
    ("subset", "⊂"),
    ("subseteq", "⊆"),
    ("supset", "⊃"),
    ("supseteq", "⊇"),
    ("perp", "⊥"),
    ("parallel", "∥"),
    ("mid", "∣"),
    // Arrows
    ("to", "→"),
    ("rightarrow", "→"),
    ("leftarrow", "←"),
    ("gets", "←"),
    ("leftrightarrow", "↔"),
    ("Rightarrow", "⇒"),
    ("Leftarrow", "⇐"),
    ("Leftrightarrow", "⇔"),
    ("implies", "⟹"),
    ("iff", "⟺"),
    ("mapsto", "↦"),
    ("uparrow", "↑"),
    ("downarrow", "↓"),
    // Delimiters
    ("lfloor", "⌊"),
    ("rfloor", "⌋"),
    ("lceil", "⌈"),
    ("rceil", "⌉"),
    ("langle", "⟨"),
    ("rangle", "⟩"),
    ("vert", "|"),
    ("lvert", "|"),
    ("rvert", "|"),
    ("Vert", "‖"),
    ("|", "‖"),
    // Misc
    ("infty", "∞"),
    ("partial", "∂"),
    ("nabla", "∇"),
    ("forall", "∀"),
    ("exists", "∃"),
    ("emptyset", "∅"),
    ("varnothing", "∅"),
    ("ldots", "…"),
    ("dots", "…"),
    ("cdots", "⋯"),
    ("vdots", "⋮"),
    ("ddots", "⋱"),
    ("angle", "∠"),
    ("prime", "′"),
    ("ell", "ℓ"),
    ("hbar", "ℏ"),
    ("Re", "ℜ"),
    ("Im", "ℑ"),
    ("aleph", "ℵ"),
    ("degree", "°"),
];

/// Upright operator names Typst knows under the same name.
const OPERATORS: &[&str] = &[
    "sin", "cos", "tan", "csc", "sec", "cot", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "coth", "log", "ln", "lg", "exp", "lim", "liminf", "limsup", "max", "min", "sup",
    "inf", "det", "gcd", "arg", "deg", "dim", "ker", "hom", "Pr",
];

/// One-argument commands that map to a Typst function of one argument.
const WRAPPERS: &[(&str, &str)] = &[
    ("mathrm", "upright"),
    ("mathbf", "bold"),
    ("boldsymbol", "bold"),
    ("mathit", "italic"),
    ("mathbb", "bb"),
    ("mathcal", "cal"),
    ("mathsf", "sans"),
    ("mathtt", "mono"),
    ("vec", "arrow"),
    ("hat", "hat"),
    ("widehat", "hat"),
    ("tilde", "tilde"),
    ("widetilde", "tilde"),
    ("bar", "overline"),
    ("overline", "overline"),
    ("underline", "underline"),
    ("dot", "dot"),
    ("ddot", "dot.double"),
];

/// Commands that only affect sizing/style in LaTeX and have no Typst counterpart here.
const IGNORED: &[&str] = &["displaystyle", "textstyle", "limits", "nolimits", "!"];

/// Translate one math-mode segment (the text between `$` delimiters).
pub fn translate_math(src: &str) -> Result<String, TranslateError> {
    let mut parser = Parser {
        tokens: tokenize(src),
        pos: 0,
    };
    parser.sequence(false)
}

/// Translate one line of delimiter-wrapped markup into Typst markup.
///
/// Math segments (`$...$`, `\$` does not delimit) are translated with [`translate_math`];
/// any text outside them is emitted as a literal string.
pub fn translate_line(line: &str) -> Result<String, TranslateError> {
    let mut segments: Vec<(bool, String)> = Vec::new();
    let mut current = String::new();
    let mut in_math = false;
    let mut escaped = false;

    for c in line.chars() {
        if c == '$' && !escaped {
            segments.push((in_math, std::mem::take(&mut current)));
            in_math = !in_math;
            continue;
        }
        escaped = c == '\\' && !escaped;
        current.push(c);
    }

    if in_math {
        return Err(TranslateError::UnbalancedDelimiters(line.to_string()));
    }
    segments.push((false, current));

    let mut parts = Vec::new();
    for (math, text) in segments {
        if math {
            parts.push(format!("${}$", translate_math(&text)?));
        } else if !text.trim().is_empty() {
            parts.push(format!("#{}", quote(text.trim())));
        }
    }
    Ok(parts.join(" "))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// `\name` or `\c` for a single non-letter `c`. Empty for a trailing backslash.
    Command(String),
    Open,
    Close,
    Char(char),
    Space,
}

fn tokenize(src: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        let tok = match c {
            '\\' => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if !n.is_ascii_alphabetic() {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                if name.is_empty() {
                    if let Some(n) = chars.next() {
                        name.push(n);
                    }
                }
                Token::Command(name)
            }
            '{' => Token::Open,
            '}' => Token::Close,
            c if c.is_whitespace() => {
                if out.last() == Some(&Token::Space) {
                    continue;
                }
                Token::Space
            }
            c => Token::Char(c),
        };
        out.push(tok);
    }

    out
}

/// Typst math output under construction.
#[derive(Default)]
struct Output {
    pieces: Vec<String>,
    /// The last piece is a number that further digits extend.
    numeric: bool,
}

impl Output {
    fn push(&mut self, piece: String) {
        if piece.is_empty() {
            return;
        }
        self.pieces.push(piece);
        self.numeric = false;
    }

    fn push_char(&mut self, c: char) {
        if self.numeric && (c.is_ascii_digit() || c == '.') {
            if let Some(last) = self.pieces.last_mut() {
                last.push(c);
                return;
            }
        }
        if c.is_ascii_digit() {
            self.pieces.push(c.to_string());
            self.numeric = true;
            return;
        }
        self.push(escape_char(c));
    }

    /// Attach `suffix` to the previous atom, or to an empty base when there is none.
    fn attach(&mut self, suffix: &str) {
        match self.pieces.last_mut() {
            Some(last) => last.push_str(suffix),
            None => self.pieces.push(format!("\"\"{suffix}")),
        }
        self.numeric = false;
    }

    fn finish(self) -> String {
        self.pieces.join(" ")
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn skip_space(&mut self) {
        while self.peek() == Some(&Token::Space) {
            self.pos += 1;
        }
    }

    /// Translate until the end of input (top level) or the matching `}` (inside a group).
    fn sequence(&mut self, in_group: bool) -> Result<String, TranslateError> {
        let mut out = Output::default();
        loop {
            match self.next() {
                None if in_group => return Err(TranslateError::UnbalancedBraces),
                None => return Ok(out.finish()),
                Some(Token::Close) if in_group => return Ok(out.finish()),
                Some(Token::Close) => return Err(TranslateError::UnbalancedBraces),
                Some(tok) => self.token(tok, &mut out)?,
            }
        }
    }

    /// Translate until the closing `]` of an optional argument.
    fn bracket_sequence(&mut self) -> Result<String, TranslateError> {
        let mut out = Output::default();
        loop {
            match self.next() {
                None => return Err(TranslateError::UnbalancedBrackets),
                Some(Token::Char(']')) => return Ok(out.finish()),
                Some(Token::Close) => return Err(TranslateError::UnbalancedBraces),
                Some(tok) => self.token(tok, &mut out)?,
            }
        }
    }

    fn token(&mut self, tok: Token, out: &mut Output) -> Result<(), TranslateError> {
        match tok {
            Token::Space => {}
            Token::Open => {
                let inner = self.sequence(true)?;
                out.push(inner);
            }
            Token::Close => return Err(TranslateError::UnbalancedBraces),
            Token::Char(op @ ('^' | '_')) => {
                let arg = self.argument(&op.to_string())?;
                out.attach(&format!("{op}({})", or_empty(arg)));
            }
            Token::Char('\'') => out.attach("'"),
            Token::Char(c) => out.push_char(c),
            Token::Command(name) => {
                if let Some(piece) = self.command(&name)? {
                    out.push(piece);
                }
            }
        }
        Ok(())
    }

    /// One argument: a brace group, a command (with its own arguments) or a single char.
    fn argument(&mut self, owner: &str) -> Result<String, TranslateError> {
        self.skip_space();
        match self.next() {
            Some(Token::Open) => self.sequence(true),
            Some(Token::Command(name)) => Ok(self.command(&name)?.unwrap_or_default()),
            Some(Token::Char(c)) if !matches!(c, '^' | '_') => {
                let mut out = Output::default();
                out.push_char(c);
                Ok(out.finish())
            }
            _ => Err(TranslateError::MissingArgument(owner.to_string())),
        }
    }

    /// The verbatim content of a brace group, for `\text{...}`.
    fn raw_group(&mut self, owner: &str) -> Result<String, TranslateError> {
        self.skip_space();
        if self.next() != Some(Token::Open) {
            return Err(TranslateError::MissingArgument(owner.to_string()));
        }

        let mut raw = String::new();
        let mut depth = 0usize;
        loop {
            match self.next() {
                None => return Err(TranslateError::UnbalancedBraces),
                Some(Token::Close) if depth == 0 => return Ok(raw),
                Some(Token::Close) => {
                    depth -= 1;
                    raw.push('}');
                }
                Some(Token::Open) => {
                    depth += 1;
                    raw.push('{');
                }
                Some(Token::Char(c)) => raw.push(c),
                Some(Token::Space) => raw.push(' '),
                Some(Token::Command(name)) => {
                    // Escaped characters stand for themselves in text.
                    if name.chars().count() == 1 && !name.chars().all(|c| c.is_ascii_alphabetic())
                    {
                        raw.push_str(&name);
                    } else {
                        raw.push('\\');
                        raw.push_str(&name);
                    }
                }
            }
        }
    }

    fn command(&mut self, name: &str) -> Result<Option<String>, TranslateError> {
        if let Some((_, sym)) = SYMBOLS.iter().find(|(cmd, _)| *cmd == name) {
            return Ok(Some((*sym).to_string()));
        }
        if OPERATORS.contains(&name) {
            return Ok(Some(name.to_string()));
        }
        if let Some((_, func)) = WRAPPERS.iter().find(|(cmd, _)| *cmd == name) {
            let arg = self.argument(name)?;
            return Ok(Some(format!("{func}({})", or_empty(arg))));
        }
        if IGNORED.contains(&name) {
            return Ok(None);
        }

        let piece = match name {
            "frac" | "dfrac" | "tfrac" => {
                let num = self.argument(name)?;
                let den = self.argument(name)?;
                format!("frac({}, {})", or_empty(num), or_empty(den))
            }
            "binom" => {
                let n = self.argument(name)?;
                let k = self.argument(name)?;
                format!("binom({}, {})", or_empty(n), or_empty(k))
            }
            "sqrt" => {
                self.skip_space();
                if self.peek() == Some(&Token::Char('[')) {
                    self.pos += 1;
                    let index = self.bracket_sequence()?;
                    let radicand = self.argument(name)?;
                    format!("root({}, {})", or_empty(index), or_empty(radicand))
                } else {
                    let radicand = self.argument(name)?;
                    format!("sqrt({})", or_empty(radicand))
                }
            }
            "left" | "right" | "big" | "Big" | "bigg" | "Bigg" | "bigl" | "bigr" | "Bigl"
            | "Bigr" => {
                // Typst scales matched delimiters itself; keep only the delimiter.
                self.skip_space();
                match self.next() {
                    Some(Token::Char('.')) => return Ok(None),
                    Some(Token::Char(c)) => escape_char(c),
                    Some(Token::Command(delim)) => return self.command(&delim),
                    _ => return Err(TranslateError::MissingArgument(name.to_string())),
                }
            }
            "text" | "textrm" | "mbox" => quote(&self.raw_group(name)?),
            "operatorname" => format!("op({})", quote(&self.raw_group(name)?)),
            "," => "thin".to_string(),
            ":" | ">" => "med".to_string(),
            ";" => "thick".to_string(),
            " " => "space".to_string(),
            "quad" => "quad".to_string(),
            "qquad" => "wide".to_string(),
            "\\" => "\\".to_string(),
            "{" | "}" | "#" | "$" | "&" | "_" | "%" => {
                name.chars().map(escape_char).collect::<String>()
            }
            _ => return Err(TranslateError::UnknownCommand(name.to_string())),
        };
        Ok(Some(piece))
    }
}

/// Escape a character that has syntactic meaning in Typst math.
fn escape_char(c: char) -> String {
    match c {
        '#' | '$' | '"' | '\\' | '/' | ',' | ';' | '@' | '{' | '}' | '`' | '_' | '^' | '&'
        | '%' => format!("\\{c}"),
        '~' => "space".to_string(),
        c => c.to_string(),
    }
}

/// A Typst string literal.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn or_empty(arg: String) -> String {
    if arg.trim().is_empty() {
        "\"\"".to_string()
    } else {
        arg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_become_unicode() {
        assert_eq!(translate_math(r"\alpha + \beta").unwrap(), "α + β");
        assert_eq!(translate_math(r"\infty").unwrap(), "∞");
    }

    #[test]
    fn adjacent_letters_stay_separate_atoms() {
        assert_eq!(translate_math("ab").unwrap(), "a b");
        assert_eq!(translate_math(r"\alpha x").unwrap(), "α x");
    }

    #[test]
    fn digits_form_one_number() {
        assert_eq!(translate_math("12.5x").unwrap(), "12.5 x");
    }

    #[test]
    fn fractions_and_roots() {
        assert_eq!(translate_math(r"\frac{a}{b}").unwrap(), "frac(a, b)");
        assert_eq!(translate_math(r"\frac12").unwrap(), "frac(1, 2)");
        assert_eq!(translate_math(r"\frac{}{}").unwrap(), "frac(\"\", \"\")");
        assert_eq!(translate_math(r"\sqrt{x}").unwrap(), "sqrt(x)");
        assert_eq!(translate_math(r"\sqrt[3]{x}").unwrap(), "root(3, x)");
    }

    #[test]
    fn scripts_attach_to_previous_atom() {
        assert_eq!(translate_math("x^{2}").unwrap(), "x^(2)");
        assert_eq!(translate_math(r"\sum_{i=1}^{n} i").unwrap(), "∑_(i = 1)^(n) i");
        assert_eq!(translate_math("^{}").unwrap(), "\"\"^(\"\")");
        assert_eq!(translate_math("f'").unwrap(), "f'");
    }

    #[test]
    fn operator_names_pass_through() {
        assert_eq!(translate_math(r"\sin x + \arctan y").unwrap(), "sin x + arctan y");
    }

    #[test]
    fn floor_and_ceil_delimiters() {
        assert_eq!(translate_math(r"\lfloor{x}\rfloor").unwrap(), "⌊ x ⌋");
        assert_eq!(translate_math(r"\lceil{}\rceil").unwrap(), "⌈ ⌉");
    }

    #[test]
    fn left_right_keep_only_delimiters() {
        assert_eq!(translate_math(r"\left( x \right.").unwrap(), "( x");
        assert_eq!(translate_math(r"\left\{ x \right\}").unwrap(), "\\{ x \\}");
    }

    #[test]
    fn text_becomes_string_literal() {
        assert_eq!(translate_math(r"x \text{if } y").unwrap(), "x \"if \" y");
        assert_eq!(
            translate_math(r#"\text{say "hi"}"#).unwrap(),
            r#""say \"hi\"""#
        );
    }

    #[test]
    fn typst_syntax_characters_are_escaped() {
        assert_eq!(translate_math("a/b").unwrap(), "a \\/ b");
        assert_eq!(translate_math("f(x, y)").unwrap(), "f ( x \\, y )");
        assert_eq!(translate_math("#").unwrap(), "\\#");
    }

    #[test]
    fn spacing_commands() {
        assert_eq!(translate_math(r"a\,b\quad c").unwrap(), "a thin b quad c");
        assert_eq!(translate_math(r"a\!b").unwrap(), "a b");
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert_eq!(
            translate_math(r"\notacommand x"),
            Err(TranslateError::UnknownCommand("notacommand".to_string()))
        );
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert_eq!(translate_math("{x"), Err(TranslateError::UnbalancedBraces));
        assert_eq!(translate_math("x}"), Err(TranslateError::UnbalancedBraces));
        assert_eq!(
            translate_math(r"\frac{a}"),
            Err(TranslateError::MissingArgument("frac".to_string()))
        );
    }

    #[test]
    fn line_translation_handles_delimiters() {
        assert_eq!(translate_line(r"$\alpha$").unwrap(), "$α$");
        assert_eq!(translate_line("where $x$").unwrap(), "#\"where\" $x$");
        assert_eq!(translate_line(r"cost \$5").unwrap(), "#\"cost \\\\$5\"");
        assert!(matches!(
            translate_line("$x"),
            Err(TranslateError::UnbalancedDelimiters(_))
        ));
    }
}
