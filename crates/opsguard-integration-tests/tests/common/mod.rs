//! Shared test harness for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use opsguard::Opsguard;
use opsguard_audit::{ApprovalRecord, AuditPeriod, JsonlAuditLog, read_records};
use opsguard_config::Config;
use opsguard_core::{
    AffectedResource, FileAction, FileChange, RealizationPackage, SecurityTier, VcsOperation,
};
use serde_json::{Map, Value, json};
use tempfile::TempDir;

/// An opsguard instance writing approvals to a JSON-Lines log in a tempdir.
///
/// The tempdir is removed when the harness is dropped.
#[allow(dead_code)]
pub struct Harness {
    /// The assembled instance.
    pub opsguard: Opsguard,
    /// The audit log the gate writes to.
    pub log: Arc<JsonlAuditLog>,
    _dir: TempDir,
}

#[allow(dead_code)]
impl Harness {
    /// Build a harness from the built-in defaults.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Build a harness from `config`.
    pub fn with_config(config: Config) -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let log = Arc::new(JsonlAuditLog::new(
            dir.path().join("audit"),
            "approvals",
            AuditPeriod::None,
        ));
        let opsguard =
            Opsguard::with_sink(config, log.clone()).expect("default settings are valid");
        Self {
            opsguard,
            log,
            _dir: dir,
        }
    }

    /// The single log file (period `none`).
    pub fn log_path(&self) -> PathBuf {
        self.log.dir().join("approvals.jsonl")
    }

    /// Every record written so far.
    pub fn records(&self) -> Vec<ApprovalRecord> {
        if !self.log_path().exists() {
            return Vec::new();
        }
        read_records(&self.log_path()).expect("audit log is readable")
    }
}

/// A destructive package touching `files` manifests.
#[allow(dead_code)]
pub fn destructive_package(files: usize) -> RealizationPackage {
    RealizationPackage {
        title: Some("Scale api to 5 replicas".to_owned()),
        tier: Some(SecurityTier::Destructive),
        files: (0..files)
            .map(|i| FileChange::new(format!("apps/api/manifest-{i:02}.yaml"), FileAction::Modify))
            .collect(),
        vcs: vec![VcsOperation {
            commit_message: Some("feat(api): scale to 5 replicas\n\nBody text".to_owned()),
            branch: Some("feature/scale-api".to_owned()),
            remote: Some("origin".to_owned()),
            push_command: Some("git push origin feature/scale-api".to_owned()),
        }],
        resources: vec![
            AffectedResource::new("Deployment", "api")
                .with_namespace("prod")
                .with_action("update"),
        ],
        ..RealizationPackage::default()
    }
}

/// A context payload carrying every default required section.
#[allow(dead_code)]
pub fn full_context() -> Map<String, Value> {
    match json!({"task": "scale api", "environment": "prod"}) {
        Value::Object(map) => map,
        _ => unreachable!("literal is an object"),
    }
}
