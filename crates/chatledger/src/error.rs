//! Store error taxonomy.
//!
//! Invalid arguments are rejected synchronously; filesystem failures are
//! wrapped with the operation and path that failed; a log line that fails to
//! parse is fatal for the whole load — silently dropping a corrupt record
//! would hide data loss.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`crate::ChatStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session id is required")]
    MissingSessionId,

    #[error("export output path is required")]
    MissingOutputPath,

    #[error("chat storage is not configured")]
    NotConfigured,

    #[error("chat load cancelled")]
    Cancelled,

    #[error("chat payload is not valid UTF-8: {0}")]
    PayloadNotUtf8(#[from] std::str::Utf8Error),

    #[error("chat payload is not valid JSON: {0}")]
    PayloadNotJson(#[source] serde_json::Error),

    #[error("unable to encode chat record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("unable to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("malformed chat record at {}:{line}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Wrap an I/O failure with the operation and entity it hit.
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_operation_and_path() {
        let err = StoreError::io(
            "open chat session file",
            "/tmp/chats/active/a.jsonl",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("open chat session file"));
        assert!(text.contains("/tmp/chats/active/a.jsonl"));
    }

    #[test]
    fn test_malformed_record_names_line() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = StoreError::MalformedRecord {
            path: PathBuf::from("/tmp/chats/active/a.jsonl"),
            line: 3,
            source,
        };
        assert!(err.to_string().contains("a.jsonl:3"));
    }
}
