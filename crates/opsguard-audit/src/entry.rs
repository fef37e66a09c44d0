//! Approval audit records.

use opsguard_core::{ApprovalAction, SecurityTier, Timestamp, WorkflowPhase};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// A fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One approval decision, as written to the log. Never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Record identifier.
    pub id: RecordId,
    /// When the decision was recorded.
    pub timestamp: Timestamp,
    /// Who responded.
    pub actor: String,
    /// Workflow phase at the time of the decision.
    pub phase: WorkflowPhase,
    /// Whether the change set was approved.
    pub approved: bool,
    /// The resulting action.
    pub action: ApprovalAction,
    /// The literal response.
    pub response: String,
    /// Tier of the change set.
    pub tier: SecurityTier,
    /// Title of the change set, if it had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Number of files the change set touches.
    pub affected_files: usize,
    /// One line per critical operation (pushes, deletions, resource changes).
    #[serde(default)]
    pub critical_operations: Vec<String>,
}
