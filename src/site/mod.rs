//! Site model: every template of one build pass, classified and indexed.
//!
//! ```text
//! layouts/  ──► layouts by file stem
//! includes/ ──► TemplateEngine includes
//! data/     ──► data.<stem>
//! src/      ──► posts (has `date`) / pages / static files
//!                 │
//!                 └► base context { config, site, posts, tags, data }
//! ```
//!
//! A `Site` is built from scratch on every rebuild and never mutated.

mod data;


use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use tera::Context;

use crate::config::SiteConfig;
use crate::core::{BuildError, BuildMode, BuildResult};
use crate::log;
use crate::template::{Highlighter, Metadata, Template, TemplateEngine, Value};
use crate::utils::path::is_within;
use crate::utils::walk::{WalkEntry, walk_sorted};

pub use data::load_data;

/// One entry of the source tree, in walk order.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Dir(&'a Path),
    Template(&'a Template),
    /// Not a template: copied verbatim.
    Static(&'a Path),
    /// Draft template excluded by the build mode.
    Draft(&'a Path),
}

#[derive(Debug)]
pub struct Site {
    src_dir: PathBuf,
    layouts: FxHashMap<String, Template>,
    templates: FxHashMap<PathBuf, Template>,
    drafts: FxHashSet<PathBuf>,
    entries: Vec<WalkEntry>,
    /// Post source paths, newest first.
    posts: Vec<PathBuf>,
    /// Page source paths, in walk order.
    pages: Vec<PathBuf>,
    /// Tag to post source paths, in `posts` order.
    tags: BTreeMap<String, Vec<PathBuf>>,
    context: Context,
}

impl Site {
    /// Parse layouts, includes, data and every source file.
    ///
    /// The first parse error aborts the load.
    pub fn load(config: &SiteConfig, mode: BuildMode) -> BuildResult<Self> {
        let build = &config.build;
        let engine = TemplateEngine::new()
            .with_includes(&build.includes)?
            .with_highlighter(highlighter(build.highlight_theme.as_deref()));

        let mut site = Self {
            src_dir: build.src.clone(),
            layouts: load_layouts(&engine, &build.layouts)?,
            templates: FxHashMap::default(),
            drafts: FxHashSet::default(),
            entries: Vec::new(),
            posts: Vec::new(),
            pages: Vec::new(),
            tags: BTreeMap::new(),
            context: Context::new(),
        };

        let excluded = [&build.target, &build.layouts, &build.includes, &build.data];
        site.load_sources(&engine, &excluded, mode)?;
        site.index_posts();

        let data = load_data(&build.data)?;
        site.context = site.base_context(config, &data);
        Ok(site)
    }

    fn load_sources(
        &mut self,
        engine: &TemplateEngine,
        excluded: &[&PathBuf],
        mode: BuildMode,
    ) -> BuildResult<()> {
        let entries = walk_sorted(&self.src_dir).map_err(|e| BuildError::io(&self.src_dir, e))?;

        for entry in entries {
            if excluded.iter().any(|dir| is_within(&entry.path, dir)) {
                continue;
            }
            if !entry.is_dir
                && let Some(template) = engine.parse(&entry.path)?
            {
                if template.is_draft() && !mode.include_drafts {
                    self.drafts.insert(entry.path.clone());
                } else {
                    if template.is_post() {
                        self.posts.push(entry.path.clone());
                    } else {
                        self.pages.push(entry.path.clone());
                    }
                    self.templates.insert(entry.path.clone(), template);
                }
            }
            self.entries.push(entry);
        }

        Ok(())
    }

    /// Sort posts newest first and invert their tags.
    fn index_posts(&mut self) {
        let templates = &self.templates;
        let date_key = |path: &PathBuf| {
            templates[path]
                .date()
                .map(Value::to_string)
                .unwrap_or_default()
        };
        self.posts
            .sort_by(|a, b| date_key(b).cmp(&date_key(a)).then_with(|| a.cmp(b)));

        for path in &self.posts {
            for tag in templates[path].tags() {
                self.tags.entry(tag.clone()).or_default().push(path.clone());
            }
        }
    }

    fn base_context(&self, config: &SiteConfig, data: &BTreeMap<String, serde_json::Value>) -> Context {
        let posts: Vec<_> = self.posts().map(|t| self.post_entry(t)).collect();
        let tags: BTreeMap<_, Vec<_>> = self
            .tags
            .iter()
            .map(|(tag, paths)| {
                let entries = paths.iter().map(|p| self.post_entry(&self.templates[p]));
                (tag, entries.collect())
            })
            .collect();

        let mut context = Context::new();
        context.insert("config", &config.site);
        context.insert("site", &config.site);
        context.insert("posts", &posts);
        context.insert("tags", &tags);
        context.insert("data", data);
        context
    }

    /// Post metadata as seen from templates, with its site-absolute `url`.
    fn post_entry(&self, template: &Template) -> Metadata {
        let mut entry = template.metadata().clone();
        entry
            .entry("url".into())
            .or_insert_with(|| Value::String(self.url_for(template)));
        entry
    }

    /// Site-absolute URL of a template's output (`/blog/hello.html`).
    pub fn url_for(&self, template: &Template) -> String {
        let relative = template.target_path(&self.src_dir, Path::new(""));
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        format!("/{}", parts.join("/"))
    }

    // ========================================================================
    // rendering
    // ========================================================================

    /// Render a template and wrap it in its layout chain.
    ///
    /// Each layout sees `layout` (its own metadata) and `content` (the
    /// output so far); `page` stays bound to the rendered template.
    pub fn render(&self, template: &Template) -> BuildResult<String> {
        let mut context = self.context.clone();
        context.insert("page", template.metadata());
        let mut content = template.render(&context)?;

        let mut seen = FxHashSet::default();
        let mut chain = Vec::new();
        let mut next = template.layout();

        while let Some(name) = next {
            chain.push(name.to_string());
            if !seen.insert(name) {
                return Err(BuildError::LayoutCycle { chain });
            }

            let layout = self
                .layouts
                .get(name)
                .ok_or_else(|| BuildError::LayoutNotFound {
                    name: name.to_string(),
                    path: template.src_path().to_path_buf(),
                })?;

            context.insert("layout", layout.metadata());
            context.insert("content", &content);
            content = layout.render(&context)?;
            next = layout.layout();
        }

        Ok(content)
    }

    // ========================================================================
    // accessors
    // ========================================================================

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    /// Source tree entries in lexical walk order.
    pub fn sources(&self) -> impl Iterator<Item = Source<'_>> {
        self.entries.iter().map(|entry| {
            let path = entry.path.as_path();
            if entry.is_dir {
                Source::Dir(path)
            } else if let Some(template) = self.templates.get(path) {
                Source::Template(template)
            } else if self.drafts.contains(path) {
                Source::Draft(path)
            } else {
                Source::Static(path)
            }
        })
    }

    #[cfg(test)]
    pub fn template(&self, path: &Path) -> Option<&Template> {
        self.templates.get(path)
    }

    #[cfg(test)]
    pub fn layout(&self, name: &str) -> Option<&Template> {
        self.layouts.get(name)
    }

    /// Posts, newest first.
    pub fn posts(&self) -> impl Iterator<Item = &Template> {
        self.posts.iter().map(|p| &self.templates[p])
    }

    pub fn pages(&self) -> impl Iterator<Item = &Template> {
        self.pages.iter().map(|p| &self.templates[p])
    }

    /// Posts carrying `tag`, newest first.
    #[cfg(test)]
    pub fn tagged(&self, tag: &str) -> Vec<&Template> {
        self.tags
            .get(tag)
            .map(|paths| paths.iter().map(|p| &self.templates[p]).collect())
            .unwrap_or_default()
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}

fn highlighter(theme: Option<&str>) -> Option<Highlighter> {
    let theme = theme?;
    let highlighter = Highlighter::new(theme);
    if highlighter.is_none() {
        log!("warning"; "unknown highlight theme `{}`, code blocks are not highlighted", theme);
    }
    highlighter
}

/// Parse every file directly under `dir` as a layout, keyed by file stem.
///
/// Subdirectories are not searched. Hidden files are skipped; any other
/// non-template is an error.
fn load_layouts(engine: &TemplateEngine, dir: &Path) -> BuildResult<FxHashMap<String, Template>> {
    let mut layouts = FxHashMap::default();
    if !dir.is_dir() {
        return Ok(layouts);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| BuildError::io(dir, e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let name = name.to_string();

        let template = engine
            .parse(&path)?
            .ok_or_else(|| BuildError::NotALayout { path: path.clone() })?;
        layouts.insert(name, template);
    }

    Ok(layouts)
}
