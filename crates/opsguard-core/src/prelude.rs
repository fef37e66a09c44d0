//! Prelude module - commonly used types for convenient import.
//!
//! Use `use opsguard_core::prelude::*;` to import all essential types.

pub use crate::{CoreError, CoreResult};

pub use crate::{ApprovalAction, ApprovalDecision};

pub use crate::{
    AffectedResource, FileAction, FileChange, ImpactEstimate, RealizationPackage, VcsOperation,
};

pub use crate::{RiskLevel, SecurityTier, Timestamp, WorkflowPhase};
