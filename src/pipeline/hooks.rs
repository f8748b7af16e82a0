//! Output hooks applied to rendered html, css and js before writing.

use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::core::BuildMode;
use crate::debug;
use crate::embed::serve::livereload_script;

/// Output types hooks may rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Html,
    Css,
    Js,
}

impl OutputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(Self::Html),
            "css" => Some(Self::Css),
            "js" | "mjs" => Some(Self::Js),
            _ => None,
        }
    }
}

/// A rewrite step on rendered output.
pub trait OutputHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite `content`. Hooks that cannot handle it return it unchanged.
    fn apply(&self, kind: OutputKind, content: String) -> String;
}

/// Ordered list of enabled hooks. Empty means every output is written as rendered.
#[derive(Default)]
pub struct Hooks {
    hooks: Vec<Box<dyn OutputHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks for a build: minification first, then the reload client.
    pub fn for_build(minify: bool, mode: BuildMode) -> Self {
        let mut hooks = Self::new();
        if minify {
            hooks = hooks.with(Minify);
        }
        if mode.live_reload {
            hooks = hooks.with(LiveReload::new());
        }
        if !hooks.hooks.is_empty() {
            let names: Vec<_> = hooks.hooks.iter().map(|h| h.name()).collect();
            debug!("build"; "output hooks: {}", names.join(", "));
        }
        hooks
    }

    pub fn with(mut self, hook: impl OutputHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook on output written to `path`; other types pass through.
    pub fn run(&self, path: &Path, content: String) -> String {
        let Some(kind) = OutputKind::from_path(path) else {
            return content;
        };
        self.hooks
            .iter()
            .fold(content, |content, hook| hook.apply(kind, content))
    }
}

// ============================================================================
// minify
// ============================================================================

/// Minify html with minify-html, css with lightningcss, js with oxc.
pub struct Minify;

impl OutputHook for Minify {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, kind: OutputKind, content: String) -> String {
        let minified = match kind {
            OutputKind::Html => minify_html(&content),
            OutputKind::Css => minify_css(&content),
            OutputKind::Js => minify_js(&content),
        };
        minified.unwrap_or_else(|| {
            debug!("minify"; "left {:?} output unminified", kind);
            content
        })
    }
}

fn minify_html(html: &str) -> Option<String> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    String::from_utf8(minify_html::minify(html.as_bytes(), &cfg)).ok()
}

fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

fn minify_js(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return None;
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

// ============================================================================
// live reload
// ============================================================================

/// Inject the reload client before the last `</body>`, or append it.
pub struct LiveReload {
    script: String,
}

impl LiveReload {
    pub fn new() -> Self {
        Self {
            script: livereload_script(),
        }
    }
}

impl OutputHook for LiveReload {
    fn name(&self) -> &'static str {
        "livereload"
    }

    fn apply(&self, kind: OutputKind, mut content: String) -> String {
        if kind != OutputKind::Html {
            return content;
        }
        match content.to_ascii_lowercase().rfind("</body>") {
            Some(at) => content.insert_str(at, &self.script),
            None => content.push_str(&self.script),
        }
        content
    }
}
