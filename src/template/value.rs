//! Front matter values.
//!
//! Metadata is both rendering context (`page.title`) and control input
//! (`layout`, `draft`, `tags`). Control reads go through the typed
//! accessors so a wrong type becomes an `InvalidMetadata` error at the
//! access site instead of being silently treated as absent.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{BuildError, BuildResult};

/// Parsed front matter: string keys to structured values.
pub type Metadata = BTreeMap<String, Value>;

/// A structured metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Metadata),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Sequence(_) | Self::Mapping(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ============================================================================
// Checked field access
// ============================================================================

/// Read an optional string field; any other type is an error.
pub fn get_str<'a>(meta: &'a Metadata, key: &str, path: &Path) -> BuildResult<Option<&'a str>> {
    match meta.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| type_error(key, "string", value, path)),
    }
}

/// Read an optional boolean field; any other type is an error.
pub fn get_bool(meta: &Metadata, key: &str, path: &Path) -> BuildResult<Option<bool>> {
    match meta.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| type_error(key, "bool", value, path)),
    }
}

/// Read an optional list of strings; any other shape is an error.
pub fn get_str_list(meta: &Metadata, key: &str, path: &Path) -> BuildResult<Vec<String>> {
    let items = match meta.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(value) => value
            .as_sequence()
            .ok_or_else(|| type_error(key, "sequence of strings", value, path))?,
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| type_error(key, "sequence of strings", item, path))
        })
        .collect()
}

fn type_error(key: &str, expected: &str, found: &Value, path: &Path) -> BuildError {
    BuildError::metadata(
        path,
        format!("`{key}` must be a {expected}, found {}", found.type_name()),
    )
}
