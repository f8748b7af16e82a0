//! Templates: front matter files compiled into renderable units.
//!
//! A source file is a template when its first line is the `---`
//! delimiter. Everything else is a static asset and is never parsed.
//!
//! ```text
//! read_template_source ─► split ─► parse_metadata ─► Tera compile ─► Template
//!                                                                   │
//!                          render(context) ◄────────────────────────┘
//!                          └► markdown / org ─► HTML
//! ```
//!
//! Bodies are Tera templates, and Tera rejects a variable missing from the
//! context instead of printing nothing. Optional front matter fields need
//! a fallback, for instance `{{ page.title | default(value="") }}` or a
//! `{% if page.title %}` guard.

mod highlight;
mod markdown;
mod org;
mod parse;
mod render;
mod value;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use tera::Tera;

use crate::core::{BuildError, BuildResult};
use crate::utils::walk::walk_sorted;

pub use highlight::Highlighter;
pub use render::SourceFormat;
pub use value::{Metadata, Value};

use render::Converter;

/// A parsed template: metadata plus compiled body.
///
/// Created once per source file per build pass and never mutated.
#[derive(Debug)]
pub struct Template {
    src_path: PathBuf,
    /// Name of the body inside `body`, the source path.
    name: String,
    metadata: Metadata,
    body: Tera,
    converter: Converter,
    layout: Option<String>,
    draft: bool,
    tags: Vec<String>,
}

impl Template {
    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn src_ext(&self) -> Option<&str> {
        self.src_path.extension().and_then(|e| e.to_str())
    }

    /// Output extension: markdown and org become `html`, others pass through.
    pub fn target_ext(&self) -> Option<&str> {
        if self.converter.format.converts_to_html() {
            Some("html")
        } else {
            self.src_ext()
        }
    }

    /// Output location of this template, mirroring `src_root` under `target_root`.
    pub fn target_path(&self, src_root: &Path, target_root: &Path) -> PathBuf {
        let relative = self
            .src_path
            .strip_prefix(src_root)
            .unwrap_or(&self.src_path);
        let target = target_root.join(relative);
        match self.target_ext() {
            Some(ext) => target.with_extension(ext),
            None => target,
        }
    }

    /// Parent layout name (`layout` field).
    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// `draft: true` in front matter.
    pub const fn is_draft(&self) -> bool {
        self.draft
    }

    /// Templates with a `date` field are posts.
    pub fn is_post(&self) -> bool {
        self.metadata.contains_key("date")
    }

    pub fn date(&self) -> Option<&Value> {
        self.metadata.get("date")
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Compiles templates with a shared set of includes.
pub struct TemplateEngine {
    /// Partials available to every template via `{% include %}`.
    includes: Tera,
    highlighter: Option<Arc<Highlighter>>,
}

impl TemplateEngine {
    /// Engine without includes or highlighting.
    pub fn new() -> Self {
        Self {
            includes: new_tera(),
            highlighter: None,
        }
    }

    /// Register every file under `dir` as an include, named by its
    /// path relative to `dir` (`nav.html`, `partials/footer.html`).
    ///
    /// A missing directory registers nothing.
    pub fn with_includes(mut self, dir: &Path) -> BuildResult<Self> {
        if !dir.is_dir() {
            return Ok(self);
        }

        let entries = walk_sorted(dir).map_err(|e| BuildError::io(dir, e))?;
        for entry in entries.into_iter().filter(|e| !e.is_dir) {
            let content =
                std::fs::read_to_string(&entry.path).map_err(|e| BuildError::io(&entry.path, e))?;
            let name = include_name(dir, &entry.path);
            self.includes
                .add_raw_template(&name, &content)
                .map_err(|source| BuildError::TemplateCompile {
                    path: entry.path.clone(),
                    source,
                })?;
        }

        Ok(self)
    }

    /// Highlight code blocks in markdown and org output.
    pub fn with_highlighter(mut self, highlighter: Option<Highlighter>) -> Self {
        self.highlighter = highlighter.map(Arc::new);
        self
    }

    /// Try to parse `path` as a template.
    ///
    /// Returns `Ok(None)` when the file has no front matter.
    pub fn parse(&self, path: &Path) -> BuildResult<Option<Template>> {
        match parse::read_template_source(path)? {
            Some(source) => self.compile(path, &source).map(Some),
            None => Ok(None),
        }
    }

    /// Compile a source string that starts with front matter.
    pub fn compile(&self, path: &Path, source: &str) -> BuildResult<Template> {
        let parts = parse::split(path, source)?;
        let metadata = parse::parse_metadata(path, &parts.front_matter)?;

        let layout = value::get_str(&metadata, "layout", path)?.map(str::to_string);
        let draft = value::get_bool(&metadata, "draft", path)?.unwrap_or(false);
        let tags = value::get_str_list(&metadata, "tags", path)?;

        let name = path.to_string_lossy().into_owned();
        let mut body = new_tera();
        body.extend(&self.includes)
            .and_then(|()| body.add_raw_template(&name, &parts.body))
            .map_err(|source| BuildError::TemplateCompile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Template {
            src_path: path.to_path_buf(),
            name,
            metadata,
            body,
            converter: Converter {
                format: SourceFormat::from_path(path),
                highlighter: self.highlighter.clone(),
            },
            layout,
            draft,
            tags,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Tera instance with autoescaping off: bodies emit HTML verbatim.
fn new_tera() -> Tera {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera
}

fn include_name(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
