//! What the watcher watches and which events it reacts to.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::EventKind;
use notify::event::ModifyKind;

use crate::config::SiteConfig;
use crate::utils::path::is_within;
use crate::utils::walk::dirs_under;

/// Directories and filters for one watched site.
#[derive(Debug, Clone)]
pub struct WatchScope {
    pub src: PathBuf,
    pub target: PathBuf,
    /// Layouts, data and includes directories.
    pub roots: Vec<PathBuf>,
    pub debounce: Duration,
}

impl WatchScope {
    pub fn from_config(config: &SiteConfig) -> Self {
        let build = &config.build;
        Self {
            src: build.src.clone(),
            target: build.target.clone(),
            roots: vec![
                build.layouts.clone(),
                build.data.clone(),
                build.includes.clone(),
            ],
            debounce: Duration::from_millis(config.serve.debounce_ms),
        }
    }

    /// Every directory to watch non-recursively: existing roots, then
    /// `src` and each directory below it. The target tree is never watched.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let roots = self.roots.iter().filter(|dir| dir.is_dir()).cloned();
        let sources = dirs_under(&self.src)
            .into_iter()
            .filter(|dir| !is_within(dir, &self.target));

        let mut dirs: Vec<PathBuf> = Vec::new();
        for dir in roots.chain(sources) {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Whether `event` should arm the debounce timer.
    ///
    /// Access and metadata-only changes never do, nor do events that only
    /// touch editor temp files or the target tree.
    pub fn is_relevant(&self, event: &notify::Event) -> bool {
        match event.kind {
            EventKind::Access(_) | EventKind::Other => return false,
            EventKind::Modify(ModifyKind::Metadata(_)) => return false,
            _ => {}
        }

        event.paths.is_empty()
            || event
                .paths
                .iter()
                .any(|path| !is_temp_file(path) && !is_within(path, &self.target))
    }
}

/// Editor swap, backup and lock files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "swp" | "swo" | "swx" | "bak" | "bck" | "backup" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
        || name == "4913"
}

#[cfg(test)]
mod tests {
    use std::fs;

    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use tempfile::TempDir;

    use super::*;
    use crate::utils::path::normalize_path;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn scope(root: &Path) -> WatchScope {
        WatchScope {
            src: root.join("src"),
            target: root.join("src/_site"),
            roots: vec![root.join("layouts"), root.join("data"), root.join("includes")],
            debounce: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_watch_dirs() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        for sub in ["src/blog/2024", "src/_site/blog", "layouts", "includes"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }

        let dirs = scope(&root).watch_dirs();
        assert_eq!(
            dirs,
            [
                root.join("layouts"),
                root.join("includes"),
                root.join("src"),
                root.join("src/blog"),
                root.join("src/blog/2024"),
            ]
        );
    }

    #[test]
    fn test_content_events_are_relevant() {
        let scope = scope(Path::new("/site"));
        let data = EventKind::Modify(ModifyKind::Data(DataChange::Content));

        assert!(scope.is_relevant(&event(data, &["/site/src/index.md"])));
        assert!(scope.is_relevant(&event(
            EventKind::Create(CreateKind::File),
            &["/site/layouts/base.html"]
        )));
        assert!(scope.is_relevant(&event(
            EventKind::Remove(RemoveKind::Folder),
            &["/site/src/blog"]
        )));
        assert!(scope.is_relevant(&event(
            EventKind::Modify(ModifyKind::Name(notify::event::RenameMode::Both)),
            &["/site/src/a.md~", "/site/src/a.md"]
        )));
    }

    #[test]
    fn test_metadata_and_access_ignored() {
        let scope = scope(Path::new("/site"));

        assert!(!scope.is_relevant(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/site/src/index.md"]
        )));
        assert!(!scope.is_relevant(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
            &["/site/src/index.md"]
        )));
        assert!(!scope.is_relevant(&event(
            EventKind::Access(AccessKind::Any),
            &["/site/src/index.md"]
        )));
    }

    #[test]
    fn test_temp_and_target_paths_ignored() {
        let scope = scope(Path::new("/site"));
        let data = EventKind::Modify(ModifyKind::Data(DataChange::Any));

        for path in [
            "/site/src/.index.md.swp",
            "/site/src/index.md~",
            "/site/src/.#index.md",
            "/site/src/4913",
            "/site/src/_site/index.html",
        ] {
            assert!(!scope.is_relevant(&event(data, &[path])), "{path}");
        }
    }
}
