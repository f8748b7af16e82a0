//! Sorted directory walking.

use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

/// One entry below a walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Walk everything below `root` in lexical order, parents before children.
///
/// Hidden files are included. The first unreadable entry fails the walk.
pub fn walk_sorted(root: &Path) -> io::Result<Vec<WalkEntry>> {
    std::fs::read_dir(root)?;

    WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.map_err(io::Error::other)?;
            Ok(WalkEntry {
                is_dir: entry.file_type().is_dir(),
                path: entry.path(),
            })
        })
        .collect()
}

/// `root` and every directory below it, skipping unreadable entries.
pub fn dirs_under(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_sorted_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::write(root.join("c.txt"), "").unwrap();
        fs::write(root.join("a.txt"), "").unwrap();
        fs::write(root.join("b/inner/z.txt"), "").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();

        let entries = walk_sorted(root).unwrap();
        let relative: Vec<_> = entries
            .iter()
            .map(|e| e.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from(".hidden"),
                PathBuf::from("a.txt"),
                PathBuf::from("b"),
                PathBuf::from("b/inner"),
                PathBuf::from("b/inner/z.txt"),
                PathBuf::from("c.txt"),
            ]
        );
        assert!(entries[2].is_dir);
        assert!(!entries[1].is_dir);
    }

    #[test]
    fn test_dirs_under_includes_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/file"), "").unwrap();

        let dirs = dirs_under(dir.path());
        assert_eq!(dirs.len(), 3);
        assert_eq!(dirs[0], dir.path());
        assert!(dirs.contains(&dir.path().join("x/y")));
    }

    #[test]
    fn test_walk_missing_root_fails() {
        assert!(walk_sorted(Path::new("/nonexistent/kiln/src")).is_err());
    }
}
