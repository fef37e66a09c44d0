//! Opsguard Policy - Risk classification for operational shell commands.
//!
//! This crate decides whether an external executor may run a command line,
//! and at what risk. It never executes anything and performs no I/O.
//!
//! # Components
//!
//! - **Splitter** ([`split`]): quote-aware splitting at `&&`, `||`, `|`, `;`
//!   and newline
//! - **Pattern tables** ([`PatternTable`]): per-domain rules tagged
//!   [`RuleKind`], evaluated in one fixed global order
//! - **Tier classifier** ([`TierClassifier`]): maps an atomic command to a
//!   [`SecurityTier`](opsguard_core::SecurityTier); [`aggregate`] takes the
//!   worst tier of a compound command
//! - **Domain validators** ([`checks`]): commit-message hygiene and the
//!   reconciliation-only policy
//! - **Command validator** ([`CommandValidator`]): the composition root that
//!   produces one [`ValidationResult`]
//! - **Delegation matrix** ([`DelegationMatrix`]): local, delegate or blocked
//!
//! # Example
//!
//! ```
//! use opsguard_core::SecurityTier;
//! use opsguard_policy::{CommandValidator, PolicySettings};
//!
//! let validator = CommandValidator::new(&PolicySettings::default()).unwrap();
//!
//! let result = validator.validate("kubectl get pods && terraform apply");
//! assert!(result.allowed);
//! assert_eq!(result.tier, SecurityTier::Destructive);
//! assert!(result.requires_approval());
//!
//! let result = validator.validate("kubectl delete namespace prod");
//! assert!(!result.allowed);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod checks;
pub mod classify;
pub mod command;
pub mod delegation;
pub mod error;
pub mod patterns;
pub mod settings;
pub mod split;
pub mod suggest;
pub mod validator;

pub use checks::{CheckOutcome, CheckStage, CommandCheck, Rejection};
pub use classify::{Classification, TierClassifier, TierRule, aggregate};
pub use command::ParsedCommand;
pub use delegation::{
    Delegation, DelegationConditions, DelegationDecision, DelegationMatrix, KeywordScan,
};
pub use error::{PolicyError, PolicyResult};
pub use patterns::{Domain, PatternMatch, PatternTable, RuleKind, Strategy};
pub use settings::PolicySettings;
pub use split::{SplitOutcome, split, split_detailed};
pub use validator::{
    CommandAssessment, CommandValidator, ValidationObserver, ValidationRecord, ValidationResult,
};
