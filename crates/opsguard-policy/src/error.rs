//! Policy construction errors.
//!
//! Classification itself never fails: malformed commands degrade to a
//! blocking [`ValidationResult`](crate::ValidationResult). These errors only
//! arise while building pattern tables from configuration.

use thiserror::Error;

/// Errors that can occur while building the policy engine.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A built-in or configured pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// The underlying regex error.
        source: regex::Error,
    },

    /// A configured protected branch name is empty or contains whitespace.
    #[error("invalid protected branch name: {0:?}")]
    InvalidBranch(String),
}

/// Result type for policy construction.
pub type PolicyResult<T> = Result<T, PolicyError>;
