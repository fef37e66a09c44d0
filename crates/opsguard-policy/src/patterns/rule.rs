//! Rule and domain vocabulary for the pattern tables.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::command::ParsedCommand;
use crate::error::{PolicyError, PolicyResult};

/// How a rule participates in classification.
///
/// Rules are evaluated kind by kind in [`RuleKind::EVALUATION_ORDER`],
/// regardless of where they appear in a domain table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Irreversible; blocked outright, never downgraded by a dry-run flag.
    Denylist,
    /// Destructive; requires approval unless simulated.
    AlwaysForbidden,
    /// Read-only unless one of the rule's dangerous flags is present, in
    /// which case it counts as forbidden.
    ConditionalSafe,
    /// Read-only.
    AlwaysSafe,
}

impl RuleKind {
    /// The fixed global evaluation order.
    pub const EVALUATION_ORDER: [Self; 4] = [
        Self::Denylist,
        Self::AlwaysForbidden,
        Self::ConditionalSafe,
        Self::AlwaysSafe,
    ];
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denylist => write!(f, "DENYLIST"),
            Self::AlwaysForbidden => write!(f, "ALWAYS_FORBIDDEN"),
            Self::ConditionalSafe => write!(f, "CONDITIONAL_SAFE"),
            Self::AlwaysSafe => write!(f, "ALWAYS_SAFE"),
        }
    }
}

/// How a domain decides what is safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Only commands matching a safe rule are read-only.
    Allowlist,
    /// Every command of the domain's programs is read-only unless it
    /// matches a forbidden rule.
    Denylist,
}

/// The tool family a rule belongs to. Its name is the reported category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Cluster orchestration (`kubectl`, `oc`, `eksctl`, `kind`, `kustomize`).
    Kubernetes,
    /// Infrastructure as code (`terraform`, `tofu`, `terragrunt`, `pulumi`).
    Infrastructure,
    /// Package and release managers (`helm`, `helmfile`).
    Release,
    /// GitOps reconciliation (`flux`, `argocd`).
    Gitops,
    /// Version control (`git`, `gh`).
    Git,
    /// Generic file manipulation and inspection.
    Filesystem,
    /// HTTP and network clients.
    Network,
    /// Amazon Web Services CLI.
    Aws,
    /// Google Cloud CLI.
    Gcp,
    /// Operator-configured denylist entries.
    Custom,
}

impl Domain {
    /// Category name used in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Infrastructure => "infrastructure",
            Self::Release => "release",
            Self::Gitops => "gitops",
            Self::Git => "git",
            Self::Filesystem => "filesystem",
            Self::Network => "network",
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A flag condition attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagCondition {
    /// The rule applies only when at least one of these flags is present.
    Requires(&'static [&'static str]),
    /// The rule applies only while none of these flags is present.
    Unless(&'static [&'static str]),
}

impl FlagCondition {
    /// Whether the condition holds for `cmd`.
    #[must_use]
    pub fn holds(&self, cmd: &ParsedCommand) -> bool {
        match self {
            Self::Requires(flags) => cmd.has_any_flag(flags),
            Self::Unless(flags) => !cmd.has_any_flag(flags),
        }
    }
}

/// One entry of a domain table.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    domain: Domain,
    regex: Regex,
    description: String,
    condition: Option<FlagCondition>,
}

impl Rule {
    /// Compile a rule. Patterns match the lower-cased normalized command.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPattern`] if the pattern does not compile.
    pub fn new(
        kind: RuleKind,
        domain: Domain,
        pattern: &str,
        description: impl Into<String>,
        condition: Option<FlagCondition>,
    ) -> PolicyResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| PolicyError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self {
            kind,
            domain,
            regex,
            description: description.into(),
            condition,
        })
    }

    /// The rule's kind.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// The rule's domain.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Pattern source.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Human description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The flag condition, if any.
    #[must_use]
    pub fn condition(&self) -> Option<FlagCondition> {
        self.condition
    }

    /// Whether the pattern matches, ignoring the flag condition.
    #[must_use]
    pub fn pattern_matches(&self, cmd: &ParsedCommand) -> bool {
        self.regex.is_match(cmd.normalized())
    }

    /// Whether the pattern matches and the flag condition holds.
    #[must_use]
    pub fn applies(&self, cmd: &ParsedCommand) -> bool {
        self.pattern_matches(cmd) && self.condition.is_none_or(|c| c.holds(cmd))
    }
}
