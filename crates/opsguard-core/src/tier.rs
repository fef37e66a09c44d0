//! Security tiers.
//!
//! Tiers are totally ordered from least to most dangerous. Compound
//! commands take the maximum tier of their parts, so the derived [`Ord`]
//! is load-bearing: variant order must never change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Risk classification of a shell command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityTier {
    /// Reads state only (`kubectl get`, `git status`, `ls`).
    #[serde(rename = "T0_READ_ONLY")]
    ReadOnly,
    /// Validates or renders without touching live state (`terraform plan`, `helm lint`).
    #[serde(rename = "T1_VALIDATION")]
    Validation,
    /// Simulates a mutation with an explicit dry-run flag.
    #[serde(rename = "T2_DRY_RUN")]
    DryRun,
    /// Mutates or destroys state; requires a recorded human approval.
    #[serde(rename = "T3_DESTRUCTIVE")]
    Destructive,
}

impl SecurityTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 4] = [
        Self::ReadOnly,
        Self::Validation,
        Self::DryRun,
        Self::Destructive,
    ];

    /// Short code (`T0`..`T3`).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::ReadOnly => "T0",
            Self::Validation => "T1",
            Self::DryRun => "T2",
            Self::Destructive => "T3",
        }
    }

    /// Canonical name (`T0_READ_ONLY`..`T3_DESTRUCTIVE`).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadOnly => "T0_READ_ONLY",
            Self::Validation => "T1_VALIDATION",
            Self::DryRun => "T2_DRY_RUN",
            Self::Destructive => "T3_DESTRUCTIVE",
        }
    }

    /// Whether a command at this tier needs an explicit approval before it runs.
    #[must_use]
    pub fn requires_approval(self) -> bool {
        matches!(self, Self::Destructive)
    }

    /// Parse a tier, falling back to [`SecurityTier::Destructive`] for anything
    /// unrecognised.
    ///
    /// Used at boundaries where tiers arrive as loosely-typed strings and an
    /// unknown value must never weaken a check.
    #[must_use]
    pub fn parse_or_destructive(s: &str) -> Self {
        s.parse().unwrap_or(Self::Destructive)
    }
}

impl fmt::Display for SecurityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|tier| normalized == tier.code() || normalized == tier.name())
            .ok_or_else(|| CoreError::UnknownTier(s.to_owned()))
    }
}
