//! The approval gate.
//!
//! Three steps per decision:
//! 1. [`ApprovalGate::prepare`] renders the pending change set and the question
//! 2. [`ApprovalGate::resolve`] maps the literal response to a decision
//! 3. [`ApprovalGate::record`] appends the decision to the audit sink
//!
//! Matching is strict: only the canonical approve token proceeds. Paraphrases,
//! different casing and empty input all ask for clarification.

use opsguard_audit::{ApprovalRecord, AuditSink, RecordId};
use opsguard_core::{ApprovalDecision, RealizationPackage, Timestamp, WorkflowPhase};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ApprovalResult;
use crate::prompt::{self, ApprovalPrompt};
use crate::settings::ApprovalSettings;

/// Result of recording a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// The record that was (or should have been) written.
    pub entry: ApprovalRecord,
    /// Whether the sink accepted it.
    pub persisted: bool,
}

/// Builds approval prompts, resolves responses and records decisions.
pub struct ApprovalGate {
    settings: ApprovalSettings,
    sink: Arc<dyn AuditSink>,
}

impl ApprovalGate {
    /// Create a gate writing to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(settings: ApprovalSettings, sink: Arc<dyn AuditSink>) -> ApprovalResult<Self> {
        settings.validate()?;
        Ok(Self { settings, sink })
    }

    /// The gate's settings.
    #[must_use]
    pub fn settings(&self) -> &ApprovalSettings {
        &self.settings
    }

    /// Render the summary and question for `package`.
    #[must_use]
    pub fn prepare(&self, package: &RealizationPackage) -> ApprovalPrompt {
        prompt::build(package, &self.settings)
    }

    /// Map a literal response to a decision.
    ///
    /// Surrounding whitespace is ignored; everything else must match exactly.
    #[must_use]
    pub fn resolve(&self, raw_response: &str) -> ApprovalDecision {
        let response = raw_response.trim();
        let decision = if response == self.settings.approve_token {
            ApprovalDecision::proceed(raw_response)
        } else if response == self.settings.reject_token {
            ApprovalDecision::abort(raw_response)
        } else {
            ApprovalDecision::clarify(raw_response)
        };
        info!(
            action = %decision.action,
            approved = decision.approved,
            "Approval response resolved"
        );
        decision
    }

    /// Append one audit record for `decision`.
    ///
    /// Never fails: if the sink rejects the record the failure is logged and
    /// reported through [`RecordOutcome::persisted`], and the decision stands.
    pub fn record(
        &self,
        package: &RealizationPackage,
        raw_response: &str,
        decision: &ApprovalDecision,
        actor: &str,
        phase: WorkflowPhase,
    ) -> RecordOutcome {
        let entry = ApprovalRecord {
            id: RecordId::new(),
            timestamp: Timestamp::now(),
            actor: actor.to_owned(),
            phase,
            approved: decision.approved,
            action: decision.action,
            response: raw_response.to_owned(),
            tier: package.effective_tier(),
            title: package.title.clone(),
            affected_files: package.file_count(),
            critical_operations: package.critical_operations(),
        };

        let persisted = match self.sink.append(&entry) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    id = %entry.id,
                    actor = %entry.actor,
                    action = %entry.action,
                    error = %e,
                    "Failed to persist approval record"
                );
                false
            },
        };

        RecordOutcome { entry, persisted }
    }
}

impl fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalGate")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsguard_audit::{AuditError, AuditPeriod, AuditResult, JsonlAuditLog, MemoryAuditLog, read_records};
    use opsguard_core::{ApprovalAction, FileAction, FileChange, SecurityTier, VcsOperation};

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn append(&self, _record: &ApprovalRecord) -> AuditResult<()> {
            Err(AuditError::StorageError("disk full".to_owned()))
        }
    }

    fn gate() -> (ApprovalGate, Arc<MemoryAuditLog>) {
        let log = Arc::new(MemoryAuditLog::new());
        let gate = ApprovalGate::new(ApprovalSettings::default(), log.clone()).unwrap();
        (gate, log)
    }

    fn package() -> RealizationPackage {
        RealizationPackage {
            title: Some("Roll out api".to_owned()),
            tier: Some(SecurityTier::Destructive),
            files: vec![
                FileChange::new("k8s/api.yaml", FileAction::Modify),
                FileChange::new("k8s/old.yaml", FileAction::Delete),
            ],
            vcs: vec![VcsOperation {
                push_command: Some("git push origin feat/api".to_owned()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_is_literal() {
        let (gate, _) = gate();

        let approve = gate.resolve("approve");
        assert!(approve.grants_proceed());
        assert_eq!(approve.raw_response, "approve");

        let padded = gate.resolve("  approve\n");
        assert!(padded.grants_proceed());
        assert_eq!(padded.raw_response, "  approve\n");

        let reject = gate.resolve("reject");
        assert_eq!(reject.action, ApprovalAction::Abort);
        assert!(!reject.approved);

        for near_miss in ["Approve", "approved", "yes", "go ahead", "approve!", "", "ok approve"] {
            let decision = gate.resolve(near_miss);
            assert!(!decision.approved, "{near_miss:?} must not approve");
            assert_eq!(decision.action, ApprovalAction::Clarify, "{near_miss:?}");
            assert_eq!(decision.raw_response, near_miss);
        }
    }

    #[test]
    fn test_custom_tokens() {
        let log = Arc::new(MemoryAuditLog::new());
        let settings = ApprovalSettings {
            approve_token: "ship it".to_owned(),
            reject_token: "stop".to_owned(),
            ..Default::default()
        };
        let gate = ApprovalGate::new(settings, log).unwrap();
        assert!(gate.resolve("ship it").grants_proceed());
        assert_eq!(gate.resolve("approve").action, ApprovalAction::Clarify);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = ApprovalSettings {
            approve_token: String::new(),
            ..Default::default()
        };
        assert!(ApprovalGate::new(settings, Arc::new(MemoryAuditLog::new())).is_err());
    }

    #[test]
    fn test_record_captures_decision() {
        let (gate, log) = gate();
        let package = package();
        let decision = gate.resolve("approve");

        let outcome = gate.record(&package, "approve", &decision, "alice", WorkflowPhase::Approval);
        assert!(outcome.persisted);

        let records = log.records().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record, &outcome.entry);
        assert_eq!(record.actor, "alice");
        assert_eq!(record.phase, WorkflowPhase::Approval);
        assert!(record.approved);
        assert_eq!(record.action, ApprovalAction::Proceed);
        assert_eq!(record.response, "approve");
        assert_eq!(record.tier, SecurityTier::Destructive);
        assert_eq!(record.affected_files, 2);
        assert_eq!(
            record.critical_operations,
            vec![
                "push: git push origin feat/api".to_owned(),
                "delete file: k8s/old.yaml".to_owned(),
            ]
        );
    }

    #[test]
    fn test_record_failure_keeps_decision() {
        let gate = ApprovalGate::new(ApprovalSettings::default(), Arc::new(FailingSink)).unwrap();
        let decision = gate.resolve("reject");
        let outcome = gate.record(&package(), "reject", &decision, "bob", WorkflowPhase::Approval);
        assert!(!outcome.persisted);
        assert_eq!(outcome.entry.action, ApprovalAction::Abort);
    }

    #[test]
    fn test_record_appends_to_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlAuditLog::new(dir.path().join("audit"), "approvals", AuditPeriod::None);
        let gate = ApprovalGate::new(ApprovalSettings::default(), Arc::new(log)).unwrap();

        for response in ["not sure", "approve"] {
            let decision = gate.resolve(response);
            let outcome = gate.record(&package(), response, &decision, "alice", WorkflowPhase::Approval);
            assert!(outcome.persisted);
        }

        let records = read_records(&dir.path().join("audit/approvals.jsonl")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, ApprovalAction::Clarify);
        assert_eq!(records[0].response, "not sure");
        assert!(records[1].approved);
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_prepare_uses_settings() {
        let log = Arc::new(MemoryAuditLog::new());
        let settings = ApprovalSettings {
            max_files_shown: 1,
            ..Default::default()
        };
        let gate = ApprovalGate::new(settings, log).unwrap();
        let prompt = gate.prepare(&package());
        assert!(prompt.summary.contains("Files (2):"));
        assert!(prompt.summary.contains("+1 more"));
    }
}
