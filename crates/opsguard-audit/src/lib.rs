//! Opsguard Audit - Durable record of approval decisions.
//!
//! Every decision made at the approval gate is appended as one JSON line,
//! grouped into files by a configurable period and never rewritten.
//!
//! # Layout
//!
//! ```text
//! {audit_dir}/
//!   approvals-2026-03-09.jsonl
//!   approvals-2026-03-10.jsonl
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod entry;
pub mod error;
pub mod storage;

pub use entry::{ApprovalRecord, RecordId};
pub use error::{AuditError, AuditResult};
pub use storage::{
    AuditPeriod, AuditSink, JsonlAuditLog, MemoryAuditLog, read_jsonl, read_records,
};
