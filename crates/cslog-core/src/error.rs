//! Error taxonomy for session log processing.
//!
//! Errors are split by the scope they abort:
//! - [`DecodeError`]: one line or one content block. Recovered by the parser.
//! - [`ParseError`]: one file or directory. Surfaced to the caller.
//! - [`IntegrityError`]: session consistency. Reported, never raised implicitly.
//! - [`ValidationError`]: a value that must not be constructed.

use std::path::PathBuf;

use serde_json::error::Category;
use thiserror::Error;
use uuid::Uuid;

/// A single record or content block failed to decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The line is not well-formed JSON.
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Well-formed JSON that does not match the record schema.
    #[error("schema violation: {0}")]
    Schema(#[source] serde_json::Error),

    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Syntax | Category::Eof | Category::Io => Self::Syntax(err),
            Category::Data => Self::Schema(err),
        }
    }
}

/// A session file or project directory could not be processed at all.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("session file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("session path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("project path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every line was blank or skipped, so there is nothing to assemble.
    #[error("no valid records in {}", path.display())]
    EmptySession { path: PathBuf },

    /// The records decoded but could not be assembled into a session.
    #[error("invalid session in {}: {source}", path.display())]
    InvalidSession {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl ParseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A session whose contents disagree with each other.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("message {uuid} belongs to session {found}, expected {expected}")]
    SessionIdMismatch {
        expected: String,
        found: String,
        uuid: Uuid,
    },

    #[error("metadata records {recorded} messages but session holds {actual}")]
    MessageCountMismatch { recorded: usize, actual: usize },
}

/// A value failed a type or range constraint at construction time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A value that must be strictly positive was zero, negative or NaN.
    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// An aggregate that must be non-negative was negative or NaN.
    #[error("{field} must be non-negative, got {value}")]
    NegativeTotal { field: &'static str, value: f64 },

    #[error("project path must be absolute: {}", path.display())]
    NotAbsolute { path: PathBuf },

    #[error("invalid project id: {id:?}")]
    InvalidProjectId { id: String },
}

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_classifies_syntax() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\":").unwrap_err();
        assert!(matches!(DecodeError::from(err), DecodeError::Syntax(_)));
    }

    #[test]
    fn test_decode_error_classifies_schema() {
        let err = serde_json::from_str::<u32>("\"text\"").unwrap_err();
        assert!(matches!(DecodeError::from(err), DecodeError::Schema(_)));
    }

    #[test]
    fn test_parse_error_display_includes_path() {
        let err = ParseError::NotFound(PathBuf::from("/tmp/missing.jsonl"));
        assert_eq!(err.to_string(), "session file not found: /tmp/missing.jsonl");
    }
}
