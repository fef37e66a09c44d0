//! Tier classification of atomic commands and compound aggregation.

use opsguard_core::SecurityTier;
use serde::Serialize;
use std::sync::Arc;

use crate::command::ParsedCommand;
use crate::patterns::{PatternMatch, PatternTable};

/// Which precedence step decided a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TierRule {
    /// Empty or whitespace-only command.
    Empty,
    /// A denylist pattern fired, or a forbidden pattern fired with no
    /// dry-run flag present.
    Forbidden(PatternMatch),
    /// A read-only pattern matched.
    Safe,
    /// A lint, plan or render step.
    Validation,
    /// An explicit dry-run flag; `downgraded` names the forbidden rule it
    /// neutralized, if any.
    DryRun {
        /// The forbidden rule the flag neutralized.
        downgraded: Option<PatternMatch>,
    },
    /// Nothing recognized the command.
    Unrecognized,
}

impl TierRule {
    /// Short identifier for reports, e.g. `forbidden:kubernetes`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Empty => "empty".to_owned(),
            Self::Forbidden(hit) => format!("forbidden:{}", hit.category),
            Self::Safe => "safe".to_owned(),
            Self::Validation => "validation".to_owned(),
            Self::DryRun { .. } => "dry_run".to_owned(),
            Self::Unrecognized => "unrecognized".to_owned(),
        }
    }
}

/// A tier together with the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// The assigned tier.
    pub tier: SecurityTier,
    /// The precedence step that fired.
    pub rule: TierRule,
}

/// Maps atomic commands to security tiers.
///
/// Precedence, first match wins:
///
/// 1. Empty command: T3
/// 2. Denylist pattern, or forbidden pattern without a dry-run flag: T3
/// 3. Read-only pattern: T0
/// 4. Validation-only step: T1
/// 5. Explicit dry-run flag: T2, even over a destructive verb
/// 6. Anything else: T3
///
/// The classifier is stateless and shares its pattern table read-only, so
/// one instance serves any number of threads.
#[derive(Debug, Clone)]
pub struct TierClassifier {
    table: Arc<PatternTable>,
}

impl TierClassifier {
    /// Create a classifier over `table`.
    #[must_use]
    pub fn new(table: Arc<PatternTable>) -> Self {
        Self { table }
    }

    /// The underlying pattern table.
    #[must_use]
    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Classify one raw atomic command.
    #[must_use]
    pub fn classify(&self, raw: &str) -> SecurityTier {
        self.classify_parsed(&ParsedCommand::parse(raw)).tier
    }

    /// Classify a parsed atomic command, naming the step that fired.
    #[must_use]
    pub fn classify_parsed(&self, cmd: &ParsedCommand) -> Classification {
        if cmd.program().is_empty() {
            return Classification {
                tier: SecurityTier::Destructive,
                rule: TierRule::Empty,
            };
        }

        let dry_run = cmd.has_dry_run_flag();
        let forbidden = self.table.matches_forbidden(cmd);
        if let Some(hit) = &forbidden
            && (!dry_run || hit.is_denylist())
        {
            return Classification {
                tier: SecurityTier::Destructive,
                rule: TierRule::Forbidden(hit.clone()),
            };
        }

        let (tier, rule) = if self.table.matches_safe(cmd) {
            (SecurityTier::ReadOnly, TierRule::Safe)
        } else if self.table.matches_validation(cmd) {
            (SecurityTier::Validation, TierRule::Validation)
        } else if dry_run {
            (SecurityTier::DryRun, TierRule::DryRun {
                downgraded: forbidden,
            })
        } else {
            (SecurityTier::Destructive, TierRule::Unrecognized)
        };
        Classification { tier, rule }
    }
}

/// The worst tier of a compound command.
///
/// An empty sequence has no evidence of safety and yields T3.
#[must_use]
pub fn aggregate<I>(tiers: I) -> SecurityTier
where
    I: IntoIterator<Item = SecurityTier>,
{
    tiers.into_iter().max().unwrap_or(SecurityTier::Destructive)
}
