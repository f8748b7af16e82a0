//! Syntax highlighting for fenced and source code blocks.

use std::sync::LazyLock;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Tabs are expanded before highlighting.
const TAB_WIDTH: usize = 4;

/// Highlights code blocks with one configured theme.
#[derive(Debug, Clone)]
pub struct Highlighter {
    theme: Theme,
}

impl Highlighter {
    /// Look up a bundled theme by name (e.g. `InspiredGitHub`).
    pub fn new(theme: &str) -> Option<Self> {
        THEMES.themes.get(theme).map(|theme| Self {
            theme: theme.clone(),
        })
    }

    /// Names of the bundled themes, sorted.
    pub fn theme_names() -> Vec<&'static str> {
        THEMES.themes.keys().map(String::as_str).collect()
    }

    /// Render `code` as highlighted HTML wrapped in `<div class="highlight">`.
    ///
    /// Unknown languages are rendered as plain text.
    pub fn highlight(&self, code: &str, lang: &str) -> String {
        let syntax = SYNTAXES
            .find_syntax_by_token(lang.trim())
            .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());

        let mut code = code.replace('\t', &" ".repeat(TAB_WIDTH));
        if !code.ends_with('\n') {
            code.push('\n');
        }

        let html = highlighted_html_for_string(&code, &SYNTAXES, syntax, &self.theme)
            .unwrap_or_else(|_| format!("<pre><code>{}</code></pre>", tera::escape_html(&code)));

        format!("<div class=\"highlight\">\n{html}\n</div>")
    }
}
