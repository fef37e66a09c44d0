//! Prelude module - commonly used types for convenient import.
//!
//! Use `use opsguard_audit::prelude::*;` to import all essential types.

pub use crate::{AuditError, AuditResult};

pub use crate::{ApprovalRecord, RecordId};

pub use crate::{AuditPeriod, AuditSink, JsonlAuditLog, MemoryAuditLog, read_records};
