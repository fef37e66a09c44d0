//! Opsguard Approval - The human decision point for destructive change sets.
//!
//! The [`ApprovalGate`] shows a realization package to a human, turns the
//! literal reply into an [`ApprovalDecision`](opsguard_core::ApprovalDecision)
//! and appends the outcome to an audit sink.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use opsguard_approval::{ApprovalGate, ApprovalSettings};
//! use opsguard_audit::MemoryAuditLog;
//! use opsguard_core::{RealizationPackage, WorkflowPhase};
//!
//! let gate = ApprovalGate::new(ApprovalSettings::default(), Arc::new(MemoryAuditLog::new())).unwrap();
//! let package = RealizationPackage::default();
//!
//! let prompt = gate.prepare(&package);
//! assert!(prompt.decision_prompt.contains("'approve'"));
//!
//! let decision = gate.resolve("approve");
//! assert!(decision.grants_proceed());
//!
//! let outcome = gate.record(&package, "approve", &decision, "alice", WorkflowPhase::Approval);
//! assert!(outcome.persisted);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

/// Error types and results for the approval gate.
pub mod error;
pub mod gate;
pub mod prompt;
pub mod settings;

pub use error::{ApprovalError, ApprovalResult};
pub use gate::{ApprovalGate, RecordOutcome};
pub use prompt::ApprovalPrompt;
pub use settings::ApprovalSettings;
