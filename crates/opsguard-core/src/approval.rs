//! Approval decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// What the workflow does next after a human response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalAction {
    /// Carry out the change set.
    Proceed,
    /// Drop the change set.
    Abort,
    /// The response was neither approval nor rejection; ask again.
    Clarify,
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => write!(f, "PROCEED"),
            Self::Abort => write!(f, "ABORT"),
            Self::Clarify => write!(f, "CLARIFY"),
        }
    }
}

impl FromStr for ApprovalAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROCEED" => Ok(Self::Proceed),
            "ABORT" => Ok(Self::Abort),
            "CLARIFY" => Ok(Self::Clarify),
            _ => Err(CoreError::UnknownAction(s.to_owned())),
        }
    }
}

/// A decision derived from a literal human response.
///
/// Only [`ApprovalDecision::grants_proceed`] authorizes a destructive
/// realization; a missing or ambiguous response never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Whether the response approved the change set.
    pub approved: bool,
    /// The next workflow action.
    pub action: ApprovalAction,
    /// The response exactly as the human typed it.
    pub raw_response: String,
}

impl ApprovalDecision {
    /// An approval.
    #[must_use]
    pub fn proceed(raw_response: impl Into<String>) -> Self {
        Self {
            approved: true,
            action: ApprovalAction::Proceed,
            raw_response: raw_response.into(),
        }
    }

    /// A rejection.
    #[must_use]
    pub fn abort(raw_response: impl Into<String>) -> Self {
        Self {
            approved: false,
            action: ApprovalAction::Abort,
            raw_response: raw_response.into(),
        }
    }

    /// A response that must be clarified before anything happens.
    #[must_use]
    pub fn clarify(raw_response: impl Into<String>) -> Self {
        Self {
            approved: false,
            action: ApprovalAction::Clarify,
            raw_response: raw_response.into(),
        }
    }

    /// Whether this decision authorizes the workflow to proceed.
    ///
    /// Both the flag and the action code must agree.
    #[must_use]
    pub fn grants_proceed(&self) -> bool {
        self.approved && self.action == ApprovalAction::Proceed
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (approved={}, response={:?})",
            self.action, self.approved, self.raw_response
        )
    }
}
