//! Configuration types for opsguard.
//!
//! All types in this module are self-contained with no dependencies on other
//! opsguard crates. Domain settings are mirrored here and converted where
//! the engine is assembled. Every struct implements [`Default`] with the same
//! values as the embedded `defaults.toml`, so a bare `[section]` header in
//! TOML produces a working configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pattern tables and domain validators.
    pub policy: PolicySection,
    /// Phase guards and enforcement mode.
    pub guards: GuardsSection,
    /// Approval gate and audit log.
    pub approval: ApprovalSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// PolicySection
// ---------------------------------------------------------------------------

/// Command policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    /// Branches that may never be force-pushed or deleted (`release/*` allowed).
    pub protected_branches: Vec<String>,
    /// Extra regular expressions that are permanently blocked.
    pub extra_denylist: Vec<String>,
    /// Commit-message line prefixes that are stripped.
    pub forbidden_commit_trailers: Vec<String>,
    /// Reject non-conventional commit subjects.
    pub require_conventional_commits: bool,
    /// Acting-unit types restricted to reconciliation-only cluster access.
    pub reconciliation_units: Vec<String>,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            protected_branches: vec![
                "main".to_owned(),
                "master".to_owned(),
                "develop".to_owned(),
                "production".to_owned(),
            ],
            extra_denylist: Vec::new(),
            forbidden_commit_trailers: vec!["Co-Authored-By:".to_owned(), "Generated-By:".to_owned()],
            require_conventional_commits: false,
            reconciliation_units: vec!["gitops".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// GuardsSection
// ---------------------------------------------------------------------------

/// Phase guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardsSection {
    /// Raise guard violations as errors (`true`) or only record them.
    pub enforce: bool,
    /// Highest ambiguity score allowed to leave clarification (0.0 - 1.0).
    pub ambiguity_threshold: f64,
    /// Lowest routing confidence allowed to leave routing (0.0 - 1.0).
    pub min_routing_confidence: f64,
    /// Execution units the router may select.
    pub registered_units: Vec<String>,
    /// Context sections that must be present before planning.
    pub required_context_sections: Vec<String>,
}

impl Default for GuardsSection {
    fn default() -> Self {
        Self {
            enforce: true,
            ambiguity_threshold: 0.3,
            min_routing_confidence: 0.7,
            registered_units: vec![
                "gitops".to_owned(),
                "infrastructure".to_owned(),
                "kubernetes".to_owned(),
                "release".to_owned(),
                "version-control".to_owned(),
            ],
            required_context_sections: vec!["task".to_owned(), "environment".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalSection
// ---------------------------------------------------------------------------

/// Approval gate and audit log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalSection {
    /// The only response that approves.
    pub approve_token: String,
    /// The only response that rejects.
    pub reject_token: String,
    /// Files listed in a summary before `+N more`.
    pub max_files_shown: usize,
    /// Resources listed per kind before `+N more`.
    pub max_resources_per_group: usize,
    /// Audit log directory. `None` uses `{opsguard home}/audit`.
    pub audit_dir: Option<String>,
    /// Audit file name prefix.
    pub audit_prefix: String,
    /// Audit file grouping: `"daily"`, `"monthly"` or `"none"`.
    pub audit_period: String,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self {
            approve_token: "approve".to_owned(),
            reject_token: "reject".to_owned(),
            max_files_shown: 10,
            max_resources_per_group: 5,
            audit_dir: None,
            audit_prefix: "approvals".to_owned(),
            audit_period: "daily".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["opsguard_policy=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
