//! Realization packages.
//!
//! A [`RealizationPackage`] is the fully planned set of side-effecting
//! operations awaiting approval. It is created upstream, consumed once by
//! the approval gate, and its outcome is folded into the audit log.
//! Every field defaults, so a package deserializes from any subset of the
//! nested mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::tier::SecurityTier;
use crate::types::RiskLevel;

/// How a file is touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    /// A new file.
    Create,
    /// An existing file is changed.
    #[default]
    Modify,
    /// An existing file is removed.
    Delete,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Modify => write!(f, "modify"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A file the package creates, modifies or deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChange {
    /// Path relative to the repository root.
    pub path: String,
    /// What happens to the file.
    pub action: FileAction,
}

impl FileChange {
    /// Create a file change.
    #[must_use]
    pub fn new(path: impl Into<String>, action: FileAction) -> Self {
        Self {
            path: path.into(),
            action,
        }
    }
}

/// A version-control operation (commit and optional push).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsOperation {
    /// Commit message.
    pub commit_message: Option<String>,
    /// Target branch.
    pub branch: Option<String>,
    /// Remote name.
    pub remote: Option<String>,
    /// The literal push command that will be run.
    pub push_command: Option<String>,
}

impl VcsOperation {
    /// Whether the operation carries no information at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commit_message.is_none()
            && self.branch.is_none()
            && self.remote.is_none()
            && self.push_command.is_none()
    }
}

/// An external resource (cluster object, cloud resource, release) the package affects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffectedResource {
    /// Resource type, used for grouping (e.g. `Deployment`, `aws_s3_bucket`).
    pub kind: String,
    /// Resource name.
    pub name: String,
    /// Namespace, project or account, when the resource is scoped.
    pub namespace: Option<String>,
    /// What happens to the resource (`create`, `update`, `delete`, ...).
    pub action: Option<String>,
}

impl AffectedResource {
    /// Create a resource entry.
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: None,
            action: None,
        }
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// `namespace/name`, or just `name` when unscoped.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Expected impact of carrying out the package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactEstimate {
    /// Expected downtime, free-form (e.g. `"none"`, `"~2m"`).
    pub downtime: Option<String>,
    /// Overall risk.
    pub risk_level: Option<RiskLevel>,
}

/// The change set pending approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealizationPackage {
    /// Short human title.
    pub title: Option<String>,
    /// Aggregated tier of the commands the package will run, if classified.
    pub tier: Option<SecurityTier>,
    /// Files to create, modify or delete.
    pub files: Vec<FileChange>,
    /// Version-control operations.
    pub vcs: Vec<VcsOperation>,
    /// Externally affected resources.
    pub resources: Vec<AffectedResource>,
    /// Pre-flight warnings.
    pub warnings: Vec<String>,
    /// Impact estimate.
    pub impact: Option<ImpactEstimate>,
}

impl RealizationPackage {
    /// Whether the package contains no side-effecting operation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.vcs.iter().all(VcsOperation::is_empty)
            && self.resources.is_empty()
    }

    /// Number of files touched.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// The tier to gate on. An unclassified package is treated as destructive.
    #[must_use]
    pub fn effective_tier(&self) -> SecurityTier {
        self.tier.unwrap_or(SecurityTier::Destructive)
    }

    /// Resources grouped by kind, kinds in sorted order, entries in package order.
    #[must_use]
    pub fn resources_by_kind(&self) -> BTreeMap<&str, Vec<&AffectedResource>> {
        let mut groups: BTreeMap<&str, Vec<&AffectedResource>> = BTreeMap::new();
        for resource in &self.resources {
            groups.entry(resource.kind.as_str()).or_default().push(resource);
        }
        groups
    }

    /// One line per irreversible or externally visible operation.
    ///
    /// Covers push commands, file deletions and every resource whose action
    /// is not a read.
    #[must_use]
    pub fn critical_operations(&self) -> Vec<String> {
        let mut ops = Vec::new();
        for vcs in &self.vcs {
            if let Some(push) = &vcs.push_command {
                ops.push(format!("push: {push}"));
            }
        }
        for file in &self.files {
            if file.action == FileAction::Delete {
                ops.push(format!("delete file: {}", file.path));
            }
        }
        for resource in &self.resources {
            let action = resource.action.as_deref().unwrap_or("change");
            if !matches!(action, "read" | "get" | "none") {
                ops.push(format!(
                    "{action} {}: {}",
                    resource.kind,
                    resource.qualified_name()
                ));
            }
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_package() {
        let package = RealizationPackage::default();
        assert!(package.is_empty());
        assert_eq!(package.effective_tier(), SecurityTier::Destructive);

        let package = RealizationPackage {
            vcs: vec![VcsOperation::default()],
            ..Default::default()
        };
        assert!(package.is_empty(), "blank vcs entries do not count");
    }

    #[test]
    fn test_package_from_partial_json() {
        let json = r#"{
            "files": [{"path": "k8s/deploy.yaml", "action": "create"}, {"path": "README.md"}],
            "resources": [{"kind": "Deployment", "name": "api", "namespace": "prod", "action": "update"}]
        }"#;
        let package: RealizationPackage = serde_json::from_str(json).unwrap();
        assert_eq!(package.file_count(), 2);
        assert_eq!(package.files[1].action, FileAction::Modify);
        assert!(!package.is_empty());
        assert_eq!(package.resources[0].qualified_name(), "prod/api");
    }

    #[test]
    fn test_resources_by_kind() {
        let package = RealizationPackage {
            resources: vec![
                AffectedResource::new("Service", "api"),
                AffectedResource::new("Deployment", "api"),
                AffectedResource::new("Deployment", "worker"),
            ],
            ..Default::default()
        };
        let groups = package.resources_by_kind();
        let kinds: Vec<_> = groups.keys().copied().collect();
        assert_eq!(kinds, vec!["Deployment", "Service"]);
        assert_eq!(groups["Deployment"].len(), 2);
        assert_eq!(groups["Deployment"][1].name, "worker");
    }

    #[test]
    fn test_critical_operations() {
        let package = RealizationPackage {
            files: vec![
                FileChange::new("old.tf", FileAction::Delete),
                FileChange::new("main.tf", FileAction::Modify),
            ],
            vcs: vec![VcsOperation {
                push_command: Some("git push origin feat/x".to_string()),
                ..Default::default()
            }],
            resources: vec![
                AffectedResource::new("aws_s3_bucket", "logs").with_action("delete"),
                AffectedResource::new("ConfigMap", "cfg").with_action("read"),
            ],
            ..Default::default()
        };
        let ops = package.critical_operations();
        assert_eq!(
            ops,
            vec![
                "push: git push origin feat/x".to_string(),
                "delete file: old.tf".to_string(),
                "delete aws_s3_bucket: logs".to_string(),
            ]
        );
    }
}
