//! Routing decision: handle a task locally, delegate it to a specialist
//! unit, or refuse it.
//!
//! The matrix is an ordered rule list where the first matching rule wins.
//! Every decision names the rule that produced it, so a routing choice can
//! always be traced to exactly one line of [`DelegationMatrix::RULES`].

use opsguard_core::SecurityTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Where a task goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Delegation {
    /// Hand off to a specialist unit.
    Delegate,
    /// Handle in the orchestrator.
    Local,
    /// Do not run at all.
    Blocked,
}

impl fmt::Display for Delegation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delegate => write!(f, "DELEGATE"),
            Self::Local => write!(f, "LOCAL"),
            Self::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// Signals the matrix decides on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationConditions {
    /// The command validator refused the command.
    pub validation_denied: bool,
    /// The caller already named a target unit.
    pub routing_metadata: bool,
    /// Aggregated security tier of the task's commands.
    pub tier: SecurityTier,
    /// Files the task touches.
    pub files: Vec<String>,
    /// The task mentions a specialist domain.
    pub domain_keywords: bool,
    /// The task needs loaded context to be done right.
    pub context_required: bool,
    /// The command is a chain of several atomic commands.
    pub compound: bool,
    /// The task mentions approval-sensitive operations.
    pub approval_keywords: bool,
    /// A command needs live credentials.
    pub requires_credentials: bool,
}

impl Default for DelegationConditions {
    fn default() -> Self {
        Self {
            validation_denied: false,
            routing_metadata: false,
            tier: SecurityTier::Destructive,
            files: Vec::new(),
            domain_keywords: false,
            context_required: false,
            compound: false,
            approval_keywords: false,
            requires_credentials: false,
        }
    }
}

impl DelegationConditions {
    fn spans_directories(&self) -> bool {
        let dirs: BTreeSet<&Path> = self
            .files
            .iter()
            .map(|f| Path::new(f).parent().unwrap_or_else(|| Path::new("")))
            .collect();
        dirs.len() > 1
    }

    /// Fill the keyword signals from free-form task text.
    #[must_use]
    pub fn with_keywords_from(mut self, text: &str) -> Self {
        let scan = KeywordScan::of(text);
        self.domain_keywords = scan.domain;
        self.approval_keywords = scan.approval;
        self
    }
}

const DOMAIN_KEYWORDS: &[&str] = &[
    "kubernetes",
    "kubectl",
    "k8s",
    "cluster",
    "namespace",
    "helm",
    "terraform",
    "infrastructure",
    "argocd",
    "flux",
    "gitops",
    "aws",
    "gcp",
    "gcloud",
    "ingress",
    "deployment",
];

const APPROVAL_KEYWORDS: &[&str] = &[
    "delete",
    "destroy",
    "drop",
    "remove",
    "production",
    "prod",
    "force",
    "rollback",
    "migrate",
    "purge",
];

/// Whole-word keyword hits in task text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeywordScan {
    /// A specialist-domain keyword was found.
    pub domain: bool,
    /// An approval-sensitive keyword was found.
    pub approval: bool,
}

impl KeywordScan {
    /// Scan `text` case-insensitively for whole-word keyword hits.
    #[must_use]
    pub fn of(text: &str) -> Self {
        let lower = text.to_lowercase();
        let words: BTreeSet<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            domain: DOMAIN_KEYWORDS.iter().any(|k| words.contains(k)),
            approval: APPROVAL_KEYWORDS.iter().any(|k| words.contains(k)),
        }
    }
}

/// The routing outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelegationDecision {
    /// Where the task goes.
    pub decision: Delegation,
    /// Why.
    pub reason: String,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
    /// Name of the rule that fired.
    pub rule: &'static str,
}

type Predicate = fn(&DelegationConditions) -> bool;

/// One row of the matrix.
#[derive(Clone, Copy)]
pub struct DelegationRule {
    /// Stable rule name.
    pub name: &'static str,
    /// Whether the rule matches.
    pub matches: Predicate,
    /// Outcome when it matches.
    pub decision: Delegation,
    /// Confidence when it matches.
    pub confidence: f64,
    /// Reason when it matches.
    pub reason: &'static str,
}

impl fmt::Debug for DelegationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegationRule")
            .field("name", &self.name)
            .field("decision", &self.decision)
            .field("confidence", &self.confidence)
            .finish_non_exhaustive()
    }
}

/// The ordered delegation rule list.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegationMatrix;

impl DelegationMatrix {
    /// Rules in evaluation order. The last rule always matches.
    pub const RULES: &'static [DelegationRule] = &[
        DelegationRule {
            name: "validation_denied",
            matches: |c| c.validation_denied,
            decision: Delegation::Blocked,
            confidence: 1.0,
            reason: "command was denied by validation",
        },
        DelegationRule {
            name: "routing_metadata",
            matches: |c| c.routing_metadata,
            decision: Delegation::Delegate,
            confidence: 1.0,
            reason: "explicit routing metadata names the target unit",
        },
        DelegationRule {
            name: "destructive_tier",
            matches: |c| c.tier == SecurityTier::Destructive,
            decision: Delegation::Delegate,
            confidence: 1.0,
            reason: "destructive operations go through a specialist unit",
        },
        DelegationRule {
            name: "many_files",
            matches: |c| c.files.len() >= 3,
            decision: Delegation::Delegate,
            confidence: 0.9,
            reason: "task touches three or more files",
        },
        DelegationRule {
            name: "multiple_directories",
            matches: DelegationConditions::spans_directories,
            decision: Delegation::Delegate,
            confidence: 0.9,
            reason: "files span multiple directories",
        },
        DelegationRule {
            name: "domain_context",
            matches: |c| c.domain_keywords && c.context_required,
            decision: Delegation::Delegate,
            confidence: 0.85,
            reason: "domain task that needs loaded context",
        },
        DelegationRule {
            name: "compound_command",
            matches: |c| c.compound,
            decision: Delegation::Delegate,
            confidence: 0.8,
            reason: "chained commands",
        },
        DelegationRule {
            name: "read_only_single_file",
            matches: |c| {
                c.tier == SecurityTier::ReadOnly && c.files.len() <= 1 && !c.approval_keywords
            },
            decision: Delegation::Local,
            confidence: 0.9,
            reason: "read-only task on a single file",
        },
        DelegationRule {
            name: "validation_single_file",
            matches: |c| {
                c.tier == SecurityTier::Validation
                    && c.files.len() <= 1
                    && !c.requires_credentials
            },
            decision: Delegation::Local,
            confidence: 0.85,
            reason: "validation on a single file without credentials",
        },
        FALLBACK,
    ];

    /// Decide where a task goes. Deterministic for equal inputs.
    #[must_use]
    pub fn decide(&self, conditions: &DelegationConditions) -> DelegationDecision {
        let rule = Self::RULES
            .iter()
            .find(|r| (r.matches)(conditions))
            .copied()
            .unwrap_or(FALLBACK);
        tracing::debug!(rule = rule.name, decision = %rule.decision, "Delegation decided");
        DelegationDecision {
            decision: rule.decision,
            reason: rule.reason.to_owned(),
            confidence: rule.confidence,
            rule: rule.name,
        }
    }
}

const FALLBACK: DelegationRule = DelegationRule {
    name: "fallback",
    matches: |_| true,
    decision: Delegation::Delegate,
    confidence: 0.5,
    reason: "no specific rule matched",
};

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DelegationConditions {
        DelegationConditions {
            tier: SecurityTier::ReadOnly,
            ..DelegationConditions::default()
        }
    }

    fn decide(c: &DelegationConditions) -> DelegationDecision {
        DelegationMatrix.decide(c)
    }

    #[test]
    fn test_rules_fire_in_order() {
        let cases: Vec<(DelegationConditions, Delegation, f64, &str)> = vec![
            (
                DelegationConditions {
                    validation_denied: true,
                    routing_metadata: true,
                    ..base()
                },
                Delegation::Blocked,
                1.0,
                "validation_denied",
            ),
            (
                DelegationConditions {
                    routing_metadata: true,
                    tier: SecurityTier::Destructive,
                    ..base()
                },
                Delegation::Delegate,
                1.0,
                "routing_metadata",
            ),
            (
                DelegationConditions {
                    tier: SecurityTier::Destructive,
                    ..base()
                },
                Delegation::Delegate,
                1.0,
                "destructive_tier",
            ),
            (
                DelegationConditions {
                    files: vec!["a".into(), "b".into(), "c".into()],
                    ..base()
                },
                Delegation::Delegate,
                0.9,
                "many_files",
            ),
            (
                DelegationConditions {
                    files: vec!["src/a.rs".into(), "docs/b.md".into()],
                    ..base()
                },
                Delegation::Delegate,
                0.9,
                "multiple_directories",
            ),
            (
                DelegationConditions {
                    domain_keywords: true,
                    context_required: true,
                    ..base()
                },
                Delegation::Delegate,
                0.85,
                "domain_context",
            ),
            (
                DelegationConditions {
                    compound: true,
                    ..base()
                },
                Delegation::Delegate,
                0.8,
                "compound_command",
            ),
            (base(), Delegation::Local, 0.9, "read_only_single_file"),
            (
                DelegationConditions {
                    tier: SecurityTier::Validation,
                    files: vec!["main.tf".into()],
                    ..base()
                },
                Delegation::Local,
                0.85,
                "validation_single_file",
            ),
            (
                DelegationConditions {
                    tier: SecurityTier::Validation,
                    requires_credentials: true,
                    ..base()
                },
                Delegation::Delegate,
                0.5,
                "fallback",
            ),
            (
                DelegationConditions {
                    approval_keywords: true,
                    ..base()
                },
                Delegation::Delegate,
                0.5,
                "fallback",
            ),
        ];
        for (conditions, decision, confidence, rule) in cases {
            let got = decide(&conditions);
            assert_eq!(got.decision, decision, "{rule}");
            assert!((got.confidence - confidence).abs() < f64::EPSILON, "{rule}");
            assert_eq!(got.rule, rule);
        }
    }

    #[test]
    fn test_decision_is_deterministic() {
        let conditions = DelegationConditions {
            files: vec!["x/a".into(), "y/b".into()],
            compound: true,
            ..base()
        };
        let first = decide(&conditions);
        for _ in 0..10 {
            assert_eq!(decide(&conditions), first);
        }
    }

    #[test]
    fn test_default_conditions_are_fail_safe() {
        assert_eq!(decide(&DelegationConditions::default()).rule, "destructive_tier");
    }

    #[test]
    fn test_keyword_scan() {
        let scan = KeywordScan::of("Scale the Kubernetes deployment in prod");
        assert!(scan.domain);
        assert!(scan.approval);

        let scan = KeywordScan::of("fix a typo in README");
        assert_eq!(scan, KeywordScan::default());

        let conditions = base().with_keywords_from("delete the old helm release");
        assert!(conditions.domain_keywords);
        assert!(conditions.approval_keywords);
    }

    #[test]
    fn test_last_rule_is_catch_all() {
        let last = DelegationMatrix::RULES.last().unwrap();
        assert_eq!(last.name, "fallback");
        assert!((last.matches)(&DelegationConditions::default()));
    }
}
