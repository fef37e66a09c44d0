//! Parse errors for core value types.

use thiserror::Error;

/// Errors produced when parsing core types from their string forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The string does not name a security tier.
    #[error("unknown security tier: {0}")]
    UnknownTier(String),

    /// The string does not name a workflow phase.
    #[error("unknown workflow phase: {0}")]
    UnknownPhase(String),

    /// The string does not name an approval action.
    #[error("unknown approval action: {0}")]
    UnknownAction(String),
}

/// Result type for core parsing.
pub type CoreResult<T> = Result<T, CoreError>;
