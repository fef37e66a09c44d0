//! Prelude module - commonly used types for convenient import.
//!
//! Use `use opsguard_approval::prelude::*;` to import all essential types.

pub use crate::{ApprovalError, ApprovalResult};

pub use crate::{ApprovalGate, ApprovalPrompt, ApprovalSettings, RecordOutcome};
