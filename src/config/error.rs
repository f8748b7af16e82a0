//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating `kiln.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config:\n{0}")]
    Validation(String),
}

impl ConfigError {
    /// Fold collected validation messages into one error, if any.
    pub fn from_messages(errors: Vec<String>) -> Result<(), Self> {
        if errors.is_empty() {
            return Ok(());
        }
        let lines: Vec<_> = errors.iter().map(|e| format!("- {e}")).collect();
        Err(Self::Validation(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_messages() {
        assert!(ConfigError::from_messages(Vec::new()).is_ok());

        let err = ConfigError::from_messages(vec!["a".into(), "b".into()]).unwrap_err();
        assert_eq!(err.to_string(), "invalid config:\n- a\n- b");
    }
}
