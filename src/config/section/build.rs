//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! src = "src"                       # Content sources, mirrored into target
//! target = "target"                 # Output directory (wiped on each build)
//! layouts = "layouts"               # Layout templates, keyed by file stem
//! includes = "includes"             # Partials for `{% include %}`
//! data = "data"                     # YAML/JSON/TOML files exposed as `data`
//! highlight_theme = "base16-ocean.dark"
//! minify = false
//! drafts = false
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::template::Highlighter;

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    pub src: PathBuf,
    pub target: PathBuf,
    pub layouts: PathBuf,
    pub includes: PathBuf,
    pub data: PathBuf,

    /// Syntax highlighting theme for fenced code blocks. Disabled when unset.
    pub highlight_theme: Option<String>,

    /// Minify html, css and js output.
    pub minify: bool,

    /// Render templates marked `draft: true`.
    pub drafts: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            src: "src".into(),
            target: "target".into(),
            layouts: "layouts".into(),
            includes: "includes".into(),
            data: "data".into(),
            highlight_theme: None,
            minify: false,
            drafts: false,
        }
    }
}

impl BuildSectionConfig {
    /// Collect validation errors. Paths must already be absolute.
    pub fn validate(&self, root: &std::path::Path, errors: &mut Vec<String>) {
        if let Some(theme) = &self.highlight_theme
            && Highlighter::new(theme).is_none()
        {
            errors.push(format!(
                "build.highlight_theme `{theme}` is unknown, expected one of: {}",
                Highlighter::theme_names().join(", ")
            ));
        }

        // The target is wiped before every build.
        if self.target == root || root.starts_with(&self.target) {
            errors.push(format!(
                "build.target `{}` must not contain the project root",
                self.target.display()
            ));
        } else if self.src.starts_with(&self.target) {
            errors.push(format!(
                "build.target `{}` must not contain build.src",
                self.target.display()
            ));
        }

        if self.src == self.target {
            errors.push("build.src and build.target must differ".into());
        }
    }
}
