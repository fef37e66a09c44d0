//! Audit-related error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur with audit logging.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The log file or its directory could not be written or read.
    #[error("audit I/O error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A record could not be encoded.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Storage error (lock poisoned, backend unavailable, etc.).
    #[error("storage error: {0}")]
    StorageError(String),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
