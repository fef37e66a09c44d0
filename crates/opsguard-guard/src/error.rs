//! Guard enforcement errors.

use opsguard_core::WorkflowPhase;
use thiserror::Error;

/// Errors raised by guard enforcement and the workflow state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// A guard failed while enforcement is strict.
    #[error("guard {guard} failed in phase {phase}: {reason}")]
    Violation {
        /// Guard name (`phase_4_approval`, ...).
        guard: String,
        /// Phase the guard protects.
        phase: WorkflowPhase,
        /// Why it failed.
        reason: String,
    },

    /// A guard for a phase other than the current one was presented.
    #[error("out of order: workflow is in {expected}, got a guard for {actual}")]
    OutOfOrder {
        /// The workflow's current phase.
        expected: WorkflowPhase,
        /// The phase of the presented guard.
        actual: WorkflowPhase,
    },

    /// The workflow halted earlier and cannot advance.
    #[error("workflow halted in {phase}: {reason}")]
    Halted {
        /// Phase where it halted.
        phase: WorkflowPhase,
        /// Failure reason.
        reason: String,
    },

    /// The workflow already finished.
    #[error("workflow already completed")]
    Completed,

    /// No guard has this name.
    #[error("unknown guard: {0}")]
    UnknownGuard(String),
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
