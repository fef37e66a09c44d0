//! End-to-end acceptance scenarios.
//!
//! Each test drives the assembled [`Opsguard`](opsguard::Opsguard) the way
//! an orchestrator would:
//! - a compound read-then-apply command needs approval
//! - a dry-run mutation is allowed without approval
//! - an empty command is refused
//! - a destructive approval guard without a decision fails in both modes
//! - a large change set is summarized with a capped file list

mod common;

use common::{Harness, destructive_package};
use opsguard_config::Config;
use opsguard_core::{SecurityTier, WorkflowPhase};
use opsguard_guard::{Enforcement, GuardArgs, GuardError};
use opsguard_policy::split;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn read_then_apply_requires_approval() {
    let h = Harness::new();
    let raw = "kubectl get pods && terraform apply";

    assert_eq!(split(raw), vec!["kubectl get pods", "terraform apply"]);

    let result = h.opsguard.validator().validate(raw);
    assert!(result.allowed);
    assert_eq!(result.tier, SecurityTier::Destructive);
    assert!(result.requires_approval());
    assert!(result.reason.contains("approval"), "reason: {}", result.reason);

    let tiers: Vec<SecurityTier> = result.commands.iter().map(|c| c.tier).collect();
    assert_eq!(tiers, vec![SecurityTier::ReadOnly, SecurityTier::Destructive]);
}

#[test]
fn dry_run_apply_needs_no_approval() {
    let h = Harness::new();
    let result = h
        .opsguard
        .validator()
        .validate("kubectl apply -f x.yaml --dry-run=client");

    assert!(result.allowed);
    assert_eq!(result.tier, SecurityTier::DryRun);
    assert!(!result.requires_approval());
}

#[test]
fn empty_command_is_refused() {
    let h = Harness::new();
    for raw in ["", "   ", "\t\n"] {
        let result = h.opsguard.validator().validate(raw);
        assert!(!result.allowed, "{raw:?} should be refused");
        assert_eq!(result.tier, SecurityTier::Destructive);
        assert!(result.reason.contains("empty"), "reason: {}", result.reason);
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

#[test]
fn missing_approval_fails_under_both_enforcement_modes() {
    let strict = Harness::new();
    assert_eq!(strict.opsguard.enforcement(), Enforcement::Strict);
    let mut engine = strict.opsguard.guard_engine();
    let err = engine
        .enforce(GuardArgs::Approval {
            tier: SecurityTier::Destructive,
            decision: None,
        })
        .unwrap_err();
    match err {
        GuardError::Violation { guard, phase, .. } => {
            assert_eq!(guard, "phase_4_approval");
            assert_eq!(phase, WorkflowPhase::Approval);
        },
        other => panic!("expected a violation, got {other:?}"),
    }
    assert_eq!(engine.history().len(), 1);
    assert!(!engine.history()[0].passed);

    let mut config = Config::default();
    config.guards.enforce = false;
    let observing = Harness::with_config(config);
    assert_eq!(observing.opsguard.enforcement(), Enforcement::ObserveOnly);
    let mut engine = observing.opsguard.guard_engine();
    let decision = engine
        .enforce(GuardArgs::Approval {
            tier: SecurityTier::Destructive,
            decision: None,
        })
        .unwrap();
    assert!(!decision.passed);
    assert_eq!(engine.history().len(), 1);
}

// ---------------------------------------------------------------------------
// Approval summary
// ---------------------------------------------------------------------------

#[test]
fn large_change_set_summary_is_capped() {
    let h = Harness::new();
    let package = destructive_package(15);
    let prompt = h.opsguard.gate().prepare(&package);

    let shown = prompt
        .summary
        .lines()
        .filter(|line| line.starts_with("  - modify apps/api/"))
        .count();
    assert_eq!(shown, 10);
    assert!(prompt.summary.contains("Files (15):"));
    assert!(prompt.summary.contains("+5 more"));
    assert!(prompt.summary.contains("manifest-09.yaml"));
    assert!(!prompt.summary.contains("manifest-10.yaml"));
    assert!(prompt.decision_prompt.contains("'approve'"));
    assert!(prompt.decision_prompt.contains("'reject'"));
}
