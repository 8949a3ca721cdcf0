//! Error types for the metric filter.

use graphwatch_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the metric filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The retention schema file could not be loaded.
    #[error("retention config error at line {line}: {reason}")]
    RetentionConfig {
        /// One-based line number in the schema file.
        line: usize,
        /// Why the line was rejected.
        reason: String,
    },

    /// A metric line failed validation; the offending line is preserved.
    #[error("malformed metric line {line:?}: {reason}")]
    Parse {
        /// The rejected line, lossily decoded for display.
        line: String,
        /// Why the line was rejected.
        reason: String,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An I/O operation failed (listen, accept, schema file read).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    /// Builds a parse error, preserving the offending line.
    #[must_use]
    pub fn parse(line: &[u8], reason: impl Into<String>) -> Self {
        Self::Parse {
            line: String::from_utf8_lossy(line).into_owned(),
            reason: reason.into(),
        }
    }
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_preserves_line() {
        let err = FilterError::parse(b"bad line", "too few fields");
        assert_eq!(
            err.to_string(),
            "malformed metric line \"bad line\": too few fields"
        );
    }

    #[test]
    fn retention_error_carries_line_number() {
        let err = FilterError::RetentionConfig {
            line: 4,
            reason: "invalid regex".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "retention config error at line 4: invalid regex"
        );
    }
}
