//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`.
///
/// Returns the path to the first `config_name` found in `start` or any of
/// its ancestors. Absolute names are returned as-is when they exist.
///
/// ```text
/// /home/user/site/src/posts/  ← start
/// /home/user/site/kiln.toml   ← found
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}
