//! The command validator: one decision per raw command line.
//!
//! Pipeline for a raw command:
//!
//! 1. Reject empty input
//! 2. Split into atomic commands
//! 3. Run format checks (may rewrite), then workflow checks
//! 4. Classify each atomic command and aggregate the worst tier
//! 5. Check every atomic command against the permanent denylist
//! 6. Allow T3 only as "approval required", distinct from a block
//!
//! When several things go wrong at once the reported reason follows a fixed
//! order: denylist, check rejection, malformed input, approval required.

use opsguard_core::SecurityTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::checks::{
    CheckOutcome, CheckStage, CommandCheck, CommitMessageCheck, ReconciliationCheck, Rejection,
};
use crate::classify::{TierClassifier, aggregate};
use crate::command::ParsedCommand;
use crate::error::PolicyResult;
use crate::patterns::{PatternMatch, PatternTable};
use crate::settings::PolicySettings;
use crate::split::split_detailed;
use crate::suggest::suggest;

/// Category reported for malformed input.
pub const SYNTAX_CATEGORY: &str = "syntax";

/// How many `sh -c` layers are unwrapped before giving up.
const MAX_SHELL_DEPTH: usize = 4;

/// The assessment of one atomic command within a validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandAssessment {
    /// The atomic command as classified (after any rewrite).
    pub command: String,
    /// Its tier.
    pub tier: SecurityTier,
    /// The classification step that fired.
    pub rule: String,
    /// The denylist entry it matched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denylisted: Option<PatternMatch>,
    /// The check that refused it, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    /// What a format check changed, if anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    /// Whether it needs live credentials.
    pub requires_credentials: bool,
}

impl CommandAssessment {
    fn is_blocked(&self) -> bool {
        self.denylisted.is_some() || self.rejection.is_some()
    }
}

/// The decision for one raw command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Whether an executor may run the command (possibly after approval).
    pub allowed: bool,
    /// Worst tier across the atomic commands.
    pub tier: SecurityTier,
    /// Why the decision was made.
    pub reason: String,
    /// The domain or check category behind a refusal or flag.
    pub category: Option<String>,
    /// Which rule produced the decision (`denylist:git`, `tier:safe`, ...).
    pub rule: String,
    /// Ranked safe alternatives.
    pub suggestions: Vec<String>,
    /// Whether any atomic command needs live credentials.
    pub requires_credentials: bool,
    /// The corrected command line when a format check rewrote it.
    pub modified_input: Option<String>,
    /// Per-atomic detail.
    pub commands: Vec<CommandAssessment>,
}

impl ValidationResult {
    /// Whether the command may run only after a recorded approval.
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        self.allowed && self.tier.requires_approval()
    }

    fn malformed(reason: &str, rule: &str) -> Self {
        Self {
            allowed: false,
            tier: SecurityTier::Destructive,
            reason: reason.to_owned(),
            category: Some(SYNTAX_CATEGORY.to_owned()),
            rule: rule.to_owned(),
            suggestions: Vec::new(),
            requires_credentials: false,
            modified_input: None,
            commands: Vec::new(),
        }
    }
}

/// Flat record handed to a [`ValidationObserver`] after every validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Aggregated tier.
    pub tier: SecurityTier,
    /// Whether the command was allowed.
    pub allowed: bool,
    /// Time spent validating, in microseconds.
    pub duration_micros: u64,
    /// Number of atomic commands.
    pub atomic_count: usize,
}

/// A sink for validation metrics.
pub trait ValidationObserver: Send + Sync {
    /// Receive one record. Must not block for long.
    fn record(&self, record: &ValidationRecord);
}

/// Composition root of the policy engine.
///
/// Built once from [`PolicySettings`] and shared read-only; every method
/// takes `&self`.
pub struct CommandValidator {
    classifier: TierClassifier,
    table: Arc<PatternTable>,
    checks: Vec<Box<dyn CommandCheck>>,
    observer: Option<Arc<dyn ValidationObserver>>,
}

impl fmt::Debug for CommandValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandValidator")
            .field("checks", &self.checks)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl CommandValidator {
    /// Build the pattern tables and the default checks.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured pattern or branch name is invalid.
    pub fn new(settings: &PolicySettings) -> PolicyResult<Self> {
        let table = Arc::new(PatternTable::new(settings)?);
        let checks: Vec<Box<dyn CommandCheck>> = vec![
            Box::new(CommitMessageCheck::new(
                &settings.forbidden_commit_trailers,
                settings.require_conventional_commits,
            )),
            Box::new(ReconciliationCheck::new(
                Arc::clone(&table),
                &settings.reconciliation_units,
            )),
        ];
        Ok(Self::with_table(table, checks))
    }

    /// Assemble a validator from prebuilt parts.
    ///
    /// Checks run in [`CheckStage`] order and, within a stage, in the order given.
    #[must_use]
    pub fn with_table(table: Arc<PatternTable>, mut checks: Vec<Box<dyn CommandCheck>>) -> Self {
        checks.sort_by_key(|c| match c.stage() {
            CheckStage::Format => 0u8,
            CheckStage::Workflow => 1,
        });
        Self {
            classifier: TierClassifier::new(Arc::clone(&table)),
            table,
            checks,
            observer: None,
        }
    }

    /// Report every validation to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ValidationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The tier classifier sharing this validator's tables.
    #[must_use]
    pub fn classifier(&self) -> &TierClassifier {
        &self.classifier
    }

    /// Validate a raw command line under the default policy.
    #[must_use]
    pub fn validate(&self, raw: &str) -> ValidationResult {
        self.validate_as(raw, None)
    }

    /// Validate a raw command line on behalf of an acting unit, enabling
    /// any stricter sub-policy registered for that unit type.
    #[must_use]
    pub fn validate_as(&self, raw: &str, unit: Option<&str>) -> ValidationResult {
        let started = Instant::now();
        let result = self.decide(raw, unit, 0);
        self.report(&result, started);
        result
    }

    fn decide(&self, raw: &str, unit: Option<&str>, depth: usize) -> ValidationResult {
        if raw.trim().is_empty() {
            warn!("Rejected empty command");
            return ValidationResult::malformed("empty command", "syntax:empty");
        }

        let outcome = split_detailed(raw);
        if outcome.commands.is_empty() {
            warn!("Rejected command with no atomic parts");
            return ValidationResult::malformed("empty command", "syntax:empty");
        }

        let mut rewrites: Vec<(Range<usize>, &str)> = Vec::new();
        let mut suggestions: Vec<String> = Vec::new();
        let mut commands = Vec::with_capacity(outcome.commands.len());

        for atomic in &outcome.commands {
            commands.push(self.assess(atomic, unit, depth, &mut suggestions));
        }
        for (assessment, span) in commands.iter().zip(&outcome.spans) {
            if assessment.rewrite.is_some() {
                rewrites.push((span.clone(), assessment.command.as_str()));
            }
        }
        let modified_input = (!rewrites.is_empty()).then(|| splice(raw, &rewrites));
        let requires_credentials = commands.iter().any(|c| c.requires_credentials);

        let tier = if outcome.unterminated_quote {
            SecurityTier::Destructive
        } else {
            aggregate(commands.iter().map(|c| c.tier))
        };

        let mut result = ValidationResult {
            allowed: true,
            tier,
            reason: String::new(),
            category: None,
            rule: String::new(),
            suggestions: Vec::new(),
            requires_credentials,
            modified_input,
            commands,
        };

        if let Some((cmd, hit)) = result
            .commands
            .iter()
            .find_map(|c| c.denylisted.as_ref().map(|hit| (c.command.clone(), hit.clone())))
        {
            warn!(category = %hit.category, command = %cmd, "Permanently blocked command");
            result.allowed = false;
            result.reason = format!("permanently blocked: {} (`{cmd}`)", hit.description);
            result.rule = format!("denylist:{}", hit.category);
            result.category = Some(hit.category);
        } else if let Some((cmd, rejection)) = result
            .commands
            .iter()
            .find_map(|c| c.rejection.as_ref().map(|r| (c.command.clone(), r.clone())))
        {
            warn!(category = %rejection.category, command = %cmd, "Command rejected by validator");
            result.allowed = false;
            result.reason = rejection.reason;
            result.rule = format!("validator:{}", rejection.category);
            result.category = Some(rejection.category);
        } else if outcome.unterminated_quote {
            warn!("Rejected command with an unterminated quote");
            result.allowed = false;
            result.reason = "unterminated quote; command boundaries are ambiguous".to_owned();
            result.rule = "syntax:unterminated_quote".to_owned();
            result.category = Some(SYNTAX_CATEGORY.to_owned());
        } else if tier.requires_approval() {
            let worst = result
                .commands
                .iter()
                .find(|c| c.tier == tier)
                .map(|c| (c.command.clone(), c.rule.clone()));
            let (cmd, rule) = worst.unwrap_or_default();
            info!(command = %cmd, rule = %rule, "Destructive command requires approval");
            result.reason = format!("approval required: `{cmd}` is destructive ({rule})");
            result.category = rule
                .trim_start_matches("shell:")
                .strip_prefix("forbidden:")
                .map(str::to_owned);
            result.rule = format!("tier:{rule}");
        } else {
            let rule = result
                .commands
                .iter()
                .find(|c| c.tier == tier)
                .map(|c| c.rule.clone())
                .unwrap_or_default();
            result.reason = format!("allowed at {}", tier.name());
            result.rule = format!("tier:{rule}");
        }

        if !result.allowed || result.tier.requires_approval() {
            result.suggestions = dedup(suggestions);
        }
        result
    }

    fn assess(
        &self,
        atomic: &str,
        unit: Option<&str>,
        depth: usize,
        suggestions: &mut Vec<String>,
    ) -> CommandAssessment {
        let mut command = atomic.to_owned();
        let mut parsed = ParsedCommand::parse(atomic);
        let mut rewrite = None;
        let mut rejection = None;

        for check in self.checks.iter().filter(|c| c.applies_to(unit)) {
            match check.check(&parsed) {
                CheckOutcome::Pass => {},
                CheckOutcome::Rewrite {
                    command: rewritten,
                    reason,
                } => {
                    debug!(check = check.name(), %reason, "Command rewritten");
                    parsed = ParsedCommand::parse(&rewritten);
                    command = rewritten;
                    rewrite = Some(reason);
                },
                CheckOutcome::Reject(r) => {
                    debug!(check = check.name(), reason = %r.reason, "Command rejected");
                    suggestions.extend(r.suggestions.iter().cloned());
                    rejection = Some(r);
                    break;
                },
            }
        }

        let classification = self.classifier.classify_parsed(&parsed);
        let denylisted = self.table.matches_denylist(&parsed);
        let hit = denylisted.as_ref().or(match &classification.rule {
            crate::classify::TierRule::Forbidden(hit) => Some(hit),
            _ => None,
        });
        if let Some(hit) = hit {
            suggestions.extend(suggest(&parsed, hit));
        }

        debug!(
            command = %command,
            tier = %classification.tier,
            rule = %classification.rule.label(),
            "Classified atomic command"
        );

        let mut assessment = CommandAssessment {
            command,
            tier: classification.tier,
            rule: classification.rule.label(),
            denylisted,
            rejection,
            rewrite,
            requires_credentials: self.table.requires_credentials(&parsed),
        };
        if let Some(script) = parsed.shell_script() {
            self.absorb_script(&mut assessment, script, unit, depth, suggestions);
        }
        assessment
    }

    /// Judge `sh -c 'script'` by the script it runs.
    fn absorb_script(
        &self,
        assessment: &mut CommandAssessment,
        script: &str,
        unit: Option<&str>,
        depth: usize,
        suggestions: &mut Vec<String>,
    ) {
        if depth >= MAX_SHELL_DEPTH {
            warn!(command = %assessment.command, "Shell nesting too deep to inspect");
            assessment.tier = SecurityTier::Destructive;
            assessment.rule = "syntax:shell_depth".to_owned();
            assessment.rejection.get_or_insert_with(|| Rejection {
                reason: "nested shell invocations are too deep to inspect".to_owned(),
                category: SYNTAX_CATEGORY.to_owned(),
                suggestions: Vec::new(),
            });
            return;
        }

        let inner = self.decide(script, unit, depth.saturating_add(1));
        let worst = inner
            .commands
            .iter()
            .find(|c| c.tier == inner.tier)
            .map_or_else(|| inner.rule.clone(), |c| c.rule.clone());
        debug!(script, tier = %inner.tier, rule = %worst, "Classified shell script");

        assessment.tier = inner.tier;
        assessment.rule = format!("shell:{worst}");
        assessment.requires_credentials |= inner.requires_credentials;
        if assessment.denylisted.is_none() {
            assessment.denylisted = inner.commands.iter().find_map(|c| c.denylisted.clone());
        }
        if !inner.allowed && assessment.denylisted.is_none() && assessment.rejection.is_none() {
            assessment.rejection = Some(Rejection {
                reason: inner.reason,
                category: inner
                    .category
                    .unwrap_or_else(|| SYNTAX_CATEGORY.to_owned()),
                suggestions: inner.suggestions.clone(),
            });
        }
        suggestions.extend(inner.suggestions);
    }

    fn report(&self, result: &ValidationResult, started: Instant) {
        let Some(observer) = &self.observer else {
            return;
        };
        observer.record(&ValidationRecord {
            tier: result.tier,
            allowed: result.allowed,
            duration_micros: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            atomic_count: result.commands.len(),
        });
    }
}

/// Replace each span of `raw` with its rewritten command.
///
/// Spans are disjoint and in input order.
fn splice(raw: &str, rewrites: &[(Range<usize>, &str)]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0usize;
    for (span, replacement) in rewrites {
        out.push_str(raw.get(last..span.start).unwrap_or_default());
        out.push_str(replacement);
        last = span.end;
    }
    out.push_str(raw.get(last..).unwrap_or_default());
    out
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
