//! Template execution and post-conversion.

use std::path::Path;
use std::sync::Arc;

use tera::Context;

use super::highlight::Highlighter;
use super::{Template, markdown, org};
use crate::core::{BuildError, BuildResult};

/// Source format, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Markdown,
    Org,
    /// Rendered output is written as-is (html, css, txt, xml, ...).
    Plain,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") => Self::Markdown,
            Some("org") => Self::Org,
            _ => Self::Plain,
        }
    }

    /// Whether output of this format is HTML regardless of source extension.
    pub const fn converts_to_html(self) -> bool {
        matches!(self, Self::Markdown | Self::Org)
    }
}

/// Converts template output to its final form.
#[derive(Debug, Clone)]
pub(super) struct Converter {
    pub(super) format: SourceFormat,
    pub(super) highlighter: Option<Arc<Highlighter>>,
}

impl Converter {
    fn convert(&self, path: &Path, rendered: String) -> BuildResult<String> {
        let hl = self.highlighter.as_deref();
        match self.format {
            SourceFormat::Plain => Ok(rendered),
            SourceFormat::Markdown => Ok(markdown::to_html(&rendered, hl)),
            SourceFormat::Org => org::to_html(&rendered, hl).map_err(|e| BuildError::Conversion {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

impl Template {
    /// Execute the body against `context`, then convert markdown/org to HTML.
    pub fn render(&self, context: &Context) -> BuildResult<String> {
        let rendered = self
            .body
            .render(&self.name, context)
            .map_err(|source| BuildError::Render {
                path: self.src_path.clone(),
                source,
            })?;

        self.converter.convert(&self.src_path, rendered)
    }

    /// Render with only `page` bound to this template's metadata.
    #[cfg(test)]
    pub fn render_standalone(&self) -> BuildResult<String> {
        let mut context = Context::new();
        context.insert("page", &self.metadata);
        self.render(&context)
    }
}
