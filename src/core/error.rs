//! Build error taxonomy.
//!
//! Every variant names the file (or layout) it failed on, so a rebuild
//! failure can be localized from the log line alone.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while loading, rendering or writing a site.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("front matter in `{}` is never closed", path.display())]
    FrontMatterUnterminated { path: PathBuf },

    #[error("invalid metadata in `{}`: {message}", path.display())]
    InvalidMetadata { path: PathBuf, message: String },

    #[error("failed to compile template `{}`", path.display())]
    TemplateCompile {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("failed to render `{}`", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("failed to convert `{}` to html: {message}", path.display())]
    Conversion { path: PathBuf, message: String },

    #[error("layout `{name}` not found (used by `{}`)", path.display())]
    LayoutNotFound { name: String, path: PathBuf },

    #[error("layout cycle detected: {}", chain.join(" -> "))]
    LayoutCycle { chain: Vec<String> },

    #[error("layout `{}` has no front matter", path.display())]
    NotALayout { path: PathBuf },

    #[error("I/O error on `{}`", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn metadata(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Short name of the failing stage, used as the log prefix.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::FrontMatterUnterminated { .. }
            | Self::InvalidMetadata { .. }
            | Self::NotALayout { .. } => "parse",
            Self::TemplateCompile { .. } => "compile",
            Self::Render { .. } | Self::LayoutNotFound { .. } | Self::LayoutCycle { .. } => {
                "render"
            }
            Self::Conversion { .. } => "convert",
            Self::Filesystem { .. } => "io",
        }
    }

    /// Full message including every nested cause, one per line.
    ///
    /// Tera keeps the useful part (line, column, offending expression)
    /// in the source chain rather than the top-level message.
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str("\n  ");
            out.push_str(&err.to_string());
            cause = err.source();
        }
        out
    }
}
