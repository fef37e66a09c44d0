//! Guard enforcement with an in-memory outcome history.
//!
//! One [`GuardEngine`] serves one workflow run. It is deliberately not
//! shared: every method that records takes `&mut self`, and callers create
//! a fresh engine per run instead of consulting a process-wide list.

use opsguard_core::{Timestamp, WorkflowPhase};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, error, warn};

use crate::error::{GuardError, GuardResult};
use crate::guards::{GUARD_NAMES, GuardArgs, GuardDecision, GuardPolicy};

/// What happens when a guard fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    /// Failures are returned as [`GuardError::Violation`].
    #[default]
    Strict,
    /// Failures are recorded and returned as a failed decision.
    ObserveOnly,
}

impl Enforcement {
    /// Strict when `enabled`, observe-only otherwise.
    #[must_use]
    pub fn from_flag(enabled: bool) -> Self {
        if enabled { Self::Strict } else { Self::ObserveOnly }
    }
}

/// One recorded guard evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardOutcome {
    /// Guard name.
    pub guard_name: String,
    /// Whether it passed.
    pub passed: bool,
    /// Why.
    pub reason: String,
    /// The phase it protects.
    pub phase: WorkflowPhase,
    /// When it ran.
    pub timestamp: Timestamp,
}

/// Runs guards, records every outcome and optionally raises on failure.
#[derive(Debug, Clone)]
pub struct GuardEngine {
    policy: GuardPolicy,
    enforcement: Enforcement,
    history: Vec<GuardOutcome>,
}

impl GuardEngine {
    /// Create an engine for one workflow run.
    #[must_use]
    pub fn new(policy: GuardPolicy, enforcement: Enforcement) -> Self {
        Self {
            policy,
            enforcement,
            history: Vec::new(),
        }
    }

    /// The guard thresholds in use.
    #[must_use]
    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// The enforcement mode.
    #[must_use]
    pub fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    /// Run a guard and record its outcome. Never fails.
    pub fn check(&mut self, args: GuardArgs<'_>) -> GuardDecision {
        let decision = self.policy.evaluate(&args);
        let name = args.guard_name();
        let phase = args.phase();
        if decision.passed {
            debug!(guard = name, phase = %phase, reason = %decision.reason, "Guard passed");
        } else {
            warn!(guard = name, phase = %phase, reason = %decision.reason, "Guard failed");
        }
        self.history.push(GuardOutcome {
            guard_name: name.to_owned(),
            passed: decision.passed,
            reason: decision.reason.clone(),
            phase,
            timestamp: Timestamp::now(),
        });
        decision
    }

    /// Run a guard, record it and, in strict mode, turn a failure into
    /// [`GuardError::Violation`].
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Violation`] when the guard fails and
    /// enforcement is [`Enforcement::Strict`].
    pub fn enforce(&mut self, args: GuardArgs<'_>) -> GuardResult<GuardDecision> {
        let decision = self.check(args);
        if decision.passed || self.enforcement == Enforcement::ObserveOnly {
            return Ok(decision);
        }
        error!(guard = args.guard_name(), reason = %decision.reason, "Guard violation");
        Err(GuardError::Violation {
            guard: args.guard_name().to_owned(),
            phase: args.phase(),
            reason: decision.reason,
        })
    }

    /// [`enforce`](Self::enforce) addressed by guard name.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::UnknownGuard`] if `name` is not a guard name or
    /// does not match `args`, and otherwise behaves like `enforce`.
    pub fn enforce_named(&mut self, name: &str, args: GuardArgs<'_>) -> GuardResult<GuardDecision> {
        if !GUARD_NAMES.contains(&name) || name != args.guard_name() {
            return Err(GuardError::UnknownGuard(name.to_owned()));
        }
        self.enforce(args)
    }

    /// Every outcome recorded so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[GuardOutcome] {
        &self.history
    }

    /// Human-readable summary of the history.
    #[must_use]
    pub fn report(&self) -> String {
        let passed = self.history.iter().filter(|o| o.passed).count();
        let failed = self.history.len().saturating_sub(passed);
        let mut out = format!(
            "Guard report: {} checks, {passed} passed, {failed} failed\n",
            self.history.len()
        );
        for outcome in &self.history {
            let mark = if outcome.passed { "PASS" } else { "FAIL" };
            let _ = writeln!(
                out,
                "  [{mark}] {} ({}): {}",
                outcome.guard_name, outcome.phase, outcome.reason
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsguard_core::{ApprovalDecision, SecurityTier};

    fn t3_without_approval() -> GuardArgs<'static> {
        GuardArgs::Approval {
            tier: SecurityTier::Destructive,
            decision: None,
        }
    }

    #[test]
    fn test_strict_mode_raises_violation() {
        let mut engine = GuardEngine::new(GuardPolicy::default(), Enforcement::Strict);
        let err = engine.enforce(t3_without_approval()).unwrap_err();
        assert!(matches!(
            err,
            GuardError::Violation { ref guard, phase: WorkflowPhase::Approval, .. }
                if guard == "phase_4_approval"
        ));
        assert_eq!(engine.history().len(), 1);
        assert!(!engine.history()[0].passed);
    }

    #[test]
    fn test_observe_only_returns_failed_decision() {
        let mut engine = GuardEngine::new(GuardPolicy::default(), Enforcement::ObserveOnly);
        let decision = engine.enforce(t3_without_approval()).unwrap();
        assert!(!decision.passed);
        assert!(decision.reason.contains("requires explicit approval"));
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_check_never_raises() {
        let mut engine = GuardEngine::new(GuardPolicy::default(), Enforcement::Strict);
        assert!(!engine.check(t3_without_approval()).passed);
    }

    #[test]
    fn test_enforce_named_checks_the_name() {
        let mut engine = GuardEngine::new(GuardPolicy::default(), Enforcement::Strict);
        let approved = ApprovalDecision::proceed("approve");
        let args = GuardArgs::Approval {
            tier: SecurityTier::Destructive,
            decision: Some(&approved),
        };
        assert!(engine.enforce_named("phase_4_approval", args).unwrap().passed);
        assert_eq!(
            engine.enforce_named("phase_5_realization", args),
            Err(GuardError::UnknownGuard("phase_5_realization".to_owned()))
        );
        assert!(matches!(
            engine.enforce_named("phase_9", args),
            Err(GuardError::UnknownGuard(_))
        ));
        assert_eq!(engine.history().len(), 1, "rejected names are not recorded");
    }

    #[test]
    fn test_engines_are_isolated() {
        let mut first = GuardEngine::new(GuardPolicy::default(), Enforcement::ObserveOnly);
        let second = GuardEngine::new(GuardPolicy::default(), Enforcement::ObserveOnly);
        let _ = first.check(GuardArgs::Clarification { ambiguity: 0.1 });
        assert_eq!(first.history().len(), 1);
        assert!(second.history().is_empty());
    }

    #[test]
    fn test_report_counts() {
        let mut engine = GuardEngine::new(GuardPolicy::default(), Enforcement::ObserveOnly);
        let _ = engine.check(GuardArgs::Clarification { ambiguity: 0.1 });
        let _ = engine.check(t3_without_approval());
        let report = engine.report();
        assert!(report.starts_with("Guard report: 2 checks, 1 passed, 1 failed"));
        assert!(report.contains("[PASS] phase_0_clarification (CLARIFICATION)"));
        assert!(report.contains("[FAIL] phase_4_approval (APPROVAL)"));
    }

    #[test]
    fn test_enforcement_from_flag() {
        assert_eq!(Enforcement::from_flag(true), Enforcement::Strict);
        assert_eq!(Enforcement::from_flag(false), Enforcement::ObserveOnly);
    }
}
