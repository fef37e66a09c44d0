//! Prelude module - commonly used types for convenient import.
//!
//! Use `use opsguard_policy::prelude::*;` to import all essential types.

pub use crate::{PolicyError, PolicyResult, PolicySettings};

pub use crate::{split, split_detailed};

pub use crate::{TierClassifier, aggregate};

pub use crate::{CommandValidator, ValidationObserver, ValidationRecord, ValidationResult};

pub use crate::{Delegation, DelegationConditions, DelegationDecision, DelegationMatrix};
