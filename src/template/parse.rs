//! Front matter detection and splitting.
//!
//! ```text
//! ---              <- first line, trimmed, must equal the delimiter
//! title: Hello     <- YAML metadata
//! ---              <- closing delimiter
//! Hello {{page.title}}
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use super::value::{Metadata, Value};
use crate::core::{BuildError, BuildResult};

/// Front matter delimiter line.
pub const DELIMITER: &str = "---";

/// Longest first line still inspected for the delimiter.
const FIRST_LINE_LIMIT: u64 = 256;

/// A template source split at its front matter delimiters.
#[derive(Debug, PartialEq, Eq)]
pub struct Split {
    pub front_matter: String,
    pub body: String,
}

/// Read `path` if it starts with a front matter delimiter.
///
/// Returns `Ok(None)` for anything else (static assets), reading at most
/// the first line of those files.
pub fn read_template_source(path: &Path) -> BuildResult<Option<String>> {
    let file = File::open(path).map_err(|e| BuildError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut first = Vec::new();
    (&mut reader)
        .take(FIRST_LINE_LIMIT)
        .read_until(b'\n', &mut first)
        .map_err(|e| BuildError::io(path, e))?;

    if !is_delimiter(&String::from_utf8_lossy(&first)) {
        return Ok(None);
    }

    let mut rest = Vec::new();
    reader
        .read_to_end(&mut rest)
        .map_err(|e| BuildError::io(path, e))?;
    first.extend_from_slice(&rest);

    String::from_utf8(first)
        .map(Some)
        .map_err(|e| BuildError::io(path, io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Split a template source into front matter and body.
///
/// The source must start with a delimiter line. Lines up to the next
/// delimiter line are metadata; the rest is the body, with its final
/// newline trimmed.
pub fn split(path: &Path, source: &str) -> BuildResult<Split> {
    let mut lines = source.lines();

    match lines.next() {
        Some(first) if is_delimiter(first) => {}
        _ => {
            return Err(BuildError::FrontMatterUnterminated {
                path: path.to_path_buf(),
            });
        }
    }

    let mut front_matter = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if is_delimiter(line) {
            closed = true;
            break;
        }
        front_matter.push_str(line);
        front_matter.push('\n');
    }

    if !closed {
        return Err(BuildError::FrontMatterUnterminated {
            path: path.to_path_buf(),
        });
    }

    let body = lines.collect::<Vec<_>>().join("\n");

    Ok(Split { front_matter, body })
}

/// Parse the metadata block. An empty block yields an empty mapping.
pub fn parse_metadata(path: &Path, front_matter: &str) -> BuildResult<Metadata> {
    if front_matter.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let value: Value = serde_yaml::from_str(front_matter)
        .map_err(|e| BuildError::metadata(path, e.to_string()))?;

    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        other => Err(BuildError::metadata(
            path,
            format!("front matter must be a mapping, found {}", other.type_name()),
        )),
    }
}

#[inline]
fn is_delimiter(line: &str) -> bool {
    line.trim() == DELIMITER
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn path() -> &'static Path {
        Path::new("page.html")
    }

    #[test]
    fn test_split_basic() {
        let parts = split(path(), "---\ntitle: Hi\n---\nHello {{page.title}}").unwrap();
        assert_eq!(parts.front_matter, "title: Hi\n");
        assert_eq!(parts.body, "Hello {{page.title}}");
    }

    #[test]
    fn test_split_trims_single_trailing_newline() {
        let parts = split(path(), "---\n---\nline\n\n").unwrap();
        assert_eq!(parts.body, "line\n");

        let parts = split(path(), "---\n---\nline\n").unwrap();
        assert_eq!(parts.body, "line");
    }

    #[test]
    fn test_split_delimiters_with_whitespace_and_crlf() {
        let parts = split(path(), "  ---  \r\na: 1\r\n--- \r\nbody\r\n").unwrap();
        assert_eq!(parts.front_matter, "a: 1\n");
        assert_eq!(parts.body, "body");
    }

    #[test]
    fn test_split_closing_delimiter_at_eof() {
        let parts = split(path(), "---\na: 1\n---").unwrap();
        assert_eq!(parts.body, "");
    }

    #[test]
    fn test_split_body_keeps_later_delimiters() {
        let parts = split(path(), "---\n---\nabove\n---\nbelow").unwrap();
        assert_eq!(parts.body, "above\n---\nbelow");
    }

    #[test]
    fn test_split_unterminated() {
        let err = split(path(), "---\ntitle: Hi\nHello").unwrap_err();
        assert!(matches!(err, BuildError::FrontMatterUnterminated { .. }));
    }

    #[test]
    fn test_parse_metadata_empty() {
        assert!(parse_metadata(path(), "").unwrap().is_empty());
        assert!(parse_metadata(path(), "  \n").unwrap().is_empty());
        assert!(parse_metadata(path(), "~\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_metadata_invalid() {
        let err = parse_metadata(path(), "title: [unclosed\n").unwrap_err();
        assert!(matches!(err, BuildError::InvalidMetadata { .. }));
        assert!(err.to_string().contains("page.html"));
    }

    #[test]
    fn test_parse_metadata_rejects_scalars() {
        let err = parse_metadata(path(), "just text\n").unwrap_err();
        assert!(err.to_string().contains("must be a mapping"));
    }

    #[test]
    fn test_read_template_source() {
        let dir = TempDir::new().unwrap();

        let template = dir.path().join("a.md");
        fs::write(&template, "---\ntitle: A\n---\nbody").unwrap();
        assert_eq!(
            read_template_source(&template).unwrap().as_deref(),
            Some("---\ntitle: A\n---\nbody")
        );

        let asset = dir.path().join("style.css");
        fs::write(&asset, "body { color: red }\n---\n").unwrap();
        assert_eq!(read_template_source(&asset).unwrap(), None);

        let binary = dir.path().join("image.png");
        fs::write(&binary, [0x89, b'P', b'N', b'G', 0xff, 0x00]).unwrap();
        assert_eq!(read_template_source(&binary).unwrap(), None);

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "").unwrap();
        assert_eq!(read_template_source(&empty).unwrap(), None);
    }

    #[test]
    fn test_read_missing_file_is_filesystem_error() {
        let err = read_template_source(Path::new("/nonexistent/kiln/file")).unwrap_err();
        assert!(matches!(err, BuildError::Filesystem { .. }));
    }
}
