//! Workflow phases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A phase of the realization workflow.
///
/// Phases are strictly sequential; the discriminant is the phase number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowPhase {
    /// Resolve ambiguity in the request.
    Clarification = 0,
    /// Select the execution unit.
    Routing = 1,
    /// Load the context the plan depends on.
    Context = 2,
    /// Produce a concrete plan.
    Planning = 3,
    /// Obtain a human decision on the plan.
    Approval = 4,
    /// Carry out the approved change set.
    Realization = 5,
    /// Record the outcome in the durable source of truth.
    SsotUpdate = 6,
}

impl WorkflowPhase {
    /// All phases in execution order.
    pub const ALL: [Self; 7] = [
        Self::Clarification,
        Self::Routing,
        Self::Context,
        Self::Planning,
        Self::Approval,
        Self::Realization,
        Self::SsotUpdate,
    ];

    /// Phase number (0..=6).
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The phase that follows this one, or `None` after the last phase.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Clarification => Some(Self::Routing),
            Self::Routing => Some(Self::Context),
            Self::Context => Some(Self::Planning),
            Self::Planning => Some(Self::Approval),
            Self::Approval => Some(Self::Realization),
            Self::Realization => Some(Self::SsotUpdate),
            Self::SsotUpdate => None,
        }
    }

    /// Upper-case name as used in reports and audit records.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Clarification => "CLARIFICATION",
            Self::Routing => "ROUTING",
            Self::Context => "CONTEXT",
            Self::Planning => "PLANNING",
            Self::Approval => "APPROVAL",
            Self::Realization => "REALIZATION",
            Self::SsotUpdate => "SSOT_UPDATE",
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkflowPhase {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|phase| normalized == phase.name() || normalized == phase.index().to_string())
            .ok_or_else(|| CoreError::UnknownPhase(s.to_owned()))
    }
}
