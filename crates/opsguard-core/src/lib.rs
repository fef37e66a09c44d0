//! Opsguard Core - Foundation types shared by every opsguard crate.
//!
//! This crate provides:
//! - [`SecurityTier`], the ordered risk classification of a shell command
//! - [`WorkflowPhase`], the fixed sequence every realization passes through
//! - [`RealizationPackage`], the pending change set presented for approval
//! - [`ApprovalDecision`], the outcome derived from a literal human response
//! - Common value types ([`RiskLevel`], [`Timestamp`])
//!
//! It has no I/O and no dependencies on other opsguard crates.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod approval;
pub mod error;
pub mod package;
pub mod phase;
pub mod tier;
pub mod types;

pub use approval::{ApprovalAction, ApprovalDecision};
pub use error::{CoreError, CoreResult};
pub use package::{
    AffectedResource, FileAction, FileChange, ImpactEstimate, RealizationPackage, VcsOperation,
};
pub use phase::WorkflowPhase;
pub use tier::SecurityTier;
pub use types::{RiskLevel, Timestamp};
