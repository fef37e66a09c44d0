use thiserror::Error;

/// Errors that can occur while building an approval gate.
///
/// Recording a decision never fails; see [`crate::ApprovalGate::record`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// The canonical approve or reject response is unusable.
    #[error("invalid approval token: {reason}")]
    InvalidToken {
        /// Why the token was rejected.
        reason: String,
    },

    /// A display cap is zero.
    #[error("invalid display limit {name}: must be at least 1")]
    InvalidLimit {
        /// Name of the setting.
        name: &'static str,
    },
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
