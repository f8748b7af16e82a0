//! Build pipeline: mirror the source tree into the target directory.
//!
//! ```text
//! Site::sources() (lexical order)
//!   ├─ Dir       ─► create mirrored directory
//!   ├─ Template  ─► Site::render ─► Hooks ─► write with target extension
//!   ├─ Static    ─► byte-for-byte copy
//!   └─ Draft     ─► skipped
//! ```
//!
//! The target directory is wiped first, so output never depends on a
//! previous build. The first error aborts; files already written stay.

pub mod hooks;


use std::fs;
use std::io;
use std::path::Path;

use crate::core::{BuildError, BuildResult};
use crate::debug;
use crate::site::{Site, Source};

pub use hooks::Hooks;

/// Counts of one build pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub rendered: usize,
    pub copied: usize,
    pub drafts: usize,
}

/// Render or copy every source entry of `site` into `target_dir`.
pub fn build(site: &Site, target_dir: &Path, hooks: &Hooks) -> BuildResult<BuildStats> {
    reset_dir(target_dir)?;

    let mut stats = BuildStats::default();
    let src_dir = site.src_dir();

    for source in site.sources() {
        match source {
            Source::Dir(path) => {
                let dest = mirror(src_dir, target_dir, path);
                fs::create_dir_all(&dest).map_err(|e| BuildError::io(&dest, e))?;
            }
            Source::Template(template) => {
                let rendered = site.render(template)?;
                let dest = template.target_path(src_dir, target_dir);
                let output = hooks.run(&dest, rendered);
                write_file(&dest, output.as_bytes())?;
                debug!("build"; "rendered {}", dest.display());
                stats.rendered += 1;
            }
            Source::Static(path) => {
                let dest = mirror(src_dir, target_dir, path);
                fs::copy(path, &dest).map_err(|e| BuildError::io(path, e))?;
                stats.copied += 1;
            }
            Source::Draft(path) => {
                debug!("build"; "skipped draft {}", path.display());
                stats.drafts += 1;
            }
        }
    }

    Ok(stats)
}

/// Remove and recreate `dir`.
fn reset_dir(dir: &Path) -> BuildResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::io(dir, e)),
    }
    fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))
}

fn mirror(src_dir: &Path, target_dir: &Path, path: &Path) -> std::path::PathBuf {
    target_dir.join(path.strip_prefix(src_dir).unwrap_or(path))
}

fn write_file(path: &Path, content: &[u8]) -> BuildResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| BuildError::io(path, e))
}
