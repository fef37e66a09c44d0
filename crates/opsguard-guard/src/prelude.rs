//! Prelude module - commonly used types for convenient import.
//!
//! Use `use opsguard_guard::prelude::*;` to import all essential types.

pub use crate::{GuardError, GuardResult};

pub use crate::{Enforcement, GuardArgs, GuardDecision, GuardEngine, GuardOutcome, GuardPolicy};

pub use crate::{Workflow, WorkflowState};
