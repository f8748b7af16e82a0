//! Data files exposed to templates as `data.<stem>`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;

use crate::core::{BuildError, BuildResult};

/// Parse every data file directly under `dir`, keyed by file stem.
///
/// Supported formats: `.yml`/`.yaml`, `.json`, `.toml`. Other files are
/// ignored and a missing directory yields no data.
pub fn load_data(dir: &Path) -> BuildResult<BTreeMap<String, JsonValue>> {
    let mut data = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(data);
    }

    let mut files: Vec<_> = fs::read_dir(dir)
        .map_err(|e| BuildError::io(dir, e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(value) = parse_data_file(&path)? {
            data.insert(stem.to_string(), value);
        }
    }

    Ok(data)
}

fn parse_data_file(path: &Path) -> BuildResult<Option<JsonValue>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let Some(ext) = ext else {
        return Ok(None);
    };
    if !matches!(ext.as_str(), "yml" | "yaml" | "json" | "toml") {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    let value = match ext.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
        "toml" => toml::from_str::<toml::Value>(&content)
            .map_err(|e| e.to_string())
            .and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string())),
        _ => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
    };

    value
        .map(Some)
        .map_err(|message| BuildError::metadata(path, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_data_formats() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("authors.yml"), "- name: Alice\n- name: Bob\n").unwrap();
        fs::write(dir.path().join("menu.json"), r#"{"home": "/"}"#).unwrap();
        fs::write(dir.path().join("build.toml"), "version = 3").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let data = load_data(dir.path()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data["authors"][1]["name"], "Bob");
        assert_eq!(data["menu"]["home"], "/");
        assert_eq!(data["build"]["version"], 3);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_data(&dir.path().join("data")).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_data_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();

        let err = load_data(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::InvalidMetadata { .. }));
    }
}
