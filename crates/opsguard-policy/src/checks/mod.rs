//! Domain validators layered on top of tier classification.
//!
//! A check sees one atomic command at a time and may pass it, rewrite it
//! or reject it. Format checks run before workflow checks, and both run
//! before the command is classified, so a rewritten command is classified
//! in its corrected form.

mod commit;
mod reconcile;

pub use commit::CommitMessageCheck;
pub use reconcile::ReconciliationCheck;

use serde::Serialize;
use std::fmt;

use crate::command::ParsedCommand;

/// When a check runs relative to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStage {
    /// Syntax and message-format checks; may rewrite.
    Format,
    /// Stricter workflow policies for particular acting units.
    Workflow,
}

/// Why a check refused a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Human-readable reason.
    pub reason: String,
    /// Category used for grouped remediation display.
    pub category: String,
    /// Ranked safe alternatives.
    pub suggestions: Vec<String>,
}

/// The outcome of one check on one atomic command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing to say.
    Pass,
    /// The command is acceptable once corrected.
    Rewrite {
        /// The corrected atomic command.
        command: String,
        /// What was changed.
        reason: String,
    },
    /// The command must not run.
    Reject(Rejection),
}

/// A validator for one class of atomic commands.
pub trait CommandCheck: fmt::Debug + Send + Sync {
    /// Stable name used in reports.
    fn name(&self) -> &'static str;

    /// When the check runs.
    fn stage(&self) -> CheckStage;

    /// Whether the check is active for the acting unit. Defaults to always.
    fn applies_to(&self, _unit: Option<&str>) -> bool {
        true
    }

    /// Inspect one atomic command.
    fn check(&self, cmd: &ParsedCommand) -> CheckOutcome;
}
