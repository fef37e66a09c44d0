//! Policy settings.
//!
//! Mirrors the `[policy]` configuration section without depending on the
//! configuration crate; the conversion happens where the engine is built.

use serde::{Deserialize, Serialize};

/// Tunables for the pattern tables and domain validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    /// Branches that may never be force-pushed or deleted. A trailing `*`
    /// matches any suffix (`release/*`).
    pub protected_branches: Vec<String>,
    /// Additional patterns (regular expressions over the normalized command)
    /// that are permanently blocked.
    pub extra_denylist: Vec<String>,
    /// Commit-message line prefixes that are stripped (case-insensitive).
    pub forbidden_commit_trailers: Vec<String>,
    /// Reject commit subjects that are not Conventional Commits.
    pub require_conventional_commits: bool,
    /// Acting-unit types that may only run simulated cluster mutations.
    pub reconciliation_units: Vec<String>,
}

impl Default for PolicySettings {
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
