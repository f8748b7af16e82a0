//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL to a file under `serve_root`.
///
/// Tries the exact path, then `index.html` for directories, then the path
/// with `.html` appended. Anything resolving outside `serve_root` is rejected.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let root = serve_root.canonicalize().ok()?;
    let local = serve_root.join(&clean);

    if let Some(found) = existing_file(&local, &root) {
        return Some(found);
    }

    if clean.is_empty() {
        return None;
    }
    let with_html = serve_root.join(format!("{clean}.html"));
    existing_file(&with_html, &root)
}

/// Canonical file for `path`, or its `index.html` when it is a directory.
fn existing_file(path: &Path, root: &Path) -> Option<PathBuf> {
    // Canonicalize to follow symlinks before the containment check
    let canonical = path.canonicalize().ok()?;
    if !canonical.starts_with(root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Decode, strip query string and fragment, trim slashes.
fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').to_string()
}
