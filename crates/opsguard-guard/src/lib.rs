//! Opsguard Guard - Phase guards for the realization workflow.
//!
//! Every transition of the seven-phase workflow is gated by a named guard:
//!
//! | Phase | Guard | Passes when |
//! |---|---|---|
//! | 0 CLARIFICATION | `phase_0_clarification` | ambiguity <= threshold |
//! | 1 ROUTING | `phase_1_routing` | confidence >= minimum and the unit is registered |
//! | 2 CONTEXT | `phase_2_context` | every required section is present and non-null |
//! | 3 PLANNING | `phase_3_planning` | the plan has steps and a classified tier |
//! | 4 APPROVAL | `phase_4_approval` | below T3, or an explicit `approved` + `PROCEED` |
//! | 5 REALIZATION | `phase_5_realization` | a non-empty package exists |
//! | 6 SSOT_UPDATE | `phase_6_ssot_update` | below T3, or the record was updated |
//!
//! The guards themselves are pure functions in [`guards`]. [`GuardEngine`]
//! records each outcome and, under [`Enforcement::Strict`], turns a failure
//! into [`GuardError::Violation`]. [`Workflow`] drives one run through the
//! phases in order.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod engine;
pub mod error;
pub mod guards;
pub mod workflow;

pub use engine::{Enforcement, GuardEngine, GuardOutcome};
pub use error::{GuardError, GuardResult};
pub use guards::{GUARD_NAMES, GuardArgs, GuardDecision, GuardPolicy, guard_name};
pub use workflow::{Workflow, WorkflowState};
