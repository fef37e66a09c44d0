//! Cross-component properties of the safety layer.
//!
//! These tests verify, against the default configuration:
//! - a compound command takes the worst tier of its parts
//! - a permanently blocked part anywhere refuses the whole line
//! - splitting leaves operator-free and quoted input intact
//! - an explicit dry-run flag downgrades a mutation to T2
//! - only the exact approve token resolves to PROCEED
//! - the approval guard passes exactly when no approval is needed or one was granted

mod common;

use common::Harness;
use opsguard_core::{ApprovalAction, ApprovalDecision, SecurityTier};
use opsguard_guard::{GuardArgs, GuardPolicy};
use opsguard_policy::{aggregate, split};

// ---------------------------------------------------------------------------
// Tier aggregation
// ---------------------------------------------------------------------------

#[test]
fn compound_tier_is_the_worst_part() {
    let h = Harness::new();
    let validator = h.opsguard.validator();
    let classifier = validator.classifier();

    for raw in [
        "kubectl get pods && terraform plan",
        "git status; helm lint ./chart | cat",
        "ls && kubectl apply -f x.yaml --dry-run=server",
        "kubectl get pods || kubectl delete pod web-0",
        "terraform plan && terraform apply; git log",
    ] {
        let expected = aggregate(split(raw).iter().map(|c| classifier.classify(c)));
        let result = validator.validate(raw);
        assert_eq!(result.tier, expected, "{raw}");
        assert_eq!(
            result.commands.iter().map(|c| c.tier).max(),
            Some(result.tier),
            "{raw}"
        );
    }
}

#[test]
fn aggregate_of_nothing_is_destructive() {
    assert_eq!(aggregate(std::iter::empty()), SecurityTier::Destructive);
    assert_eq!(
        aggregate([SecurityTier::ReadOnly, SecurityTier::Validation]),
        SecurityTier::Validation
    );
}

#[test]
fn denylisted_part_refuses_the_whole_line() {
    let h = Harness::new();
    for raw in [
        "rm -rf /",
        "kubectl get pods; rm -rf /",
        "rm -rf / && ls",
        "git status && git push --force origin main",
        "echo done | kubectl delete namespace prod",
        "terraform plan && terraform destroy -auto-approve",
        "timeout 60 kubectl delete namespace prod",
        "kubectl get ns -o name | xargs kubectl delete namespace",
        "bash -c 'kubectl delete namespace prod'",
        "kubectl delete deploy,ns prod",
        "terraform apply -destroy -auto-approve",
    ] {
        let result = h.opsguard.validator().validate(raw);
        assert!(!result.allowed, "{raw} should be refused");
        assert_eq!(result.tier, SecurityTier::Destructive, "{raw}");
        assert!(result.rule.starts_with("denylist:"), "{raw}: {}", result.rule);
    }
}

#[test]
fn denylist_beats_dry_run() {
    let h = Harness::new();
    let result = h
        .opsguard
        .validator()
        .validate("kubectl delete namespace prod --dry-run=client");
    assert!(!result.allowed);
    assert_eq!(result.tier, SecurityTier::Destructive);
    assert!(result.rule.starts_with("denylist:"));
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

#[test]
fn operator_free_input_is_one_trimmed_command() {
    for raw in ["  kubectl get pods  ", "git log --oneline", "\tterraform plan\n"] {
        assert_eq!(split(raw), vec![raw.trim().to_owned()], "{raw:?}");
    }
}

#[test]
fn quoted_operators_do_not_split() {
    assert_eq!(split("echo 'a|b'"), vec!["echo 'a|b'"]);
    assert_eq!(split(r#"echo "x && y""#), vec![r#"echo "x && y""#]);

    let h = Harness::new();
    let result = h.opsguard.validator().validate("echo 'a; rm -rf /'");
    assert!(result.allowed);
    assert_eq!(result.commands.len(), 1);
}

// ---------------------------------------------------------------------------
// Dry-run downgrade
// ---------------------------------------------------------------------------

#[test]
fn dry_run_flag_downgrades_mutations() {
    let h = Harness::new();
    let classifier = h.opsguard.validator().classifier();

    for (mutation, flag) in [
        ("kubectl apply -f x.yaml", "--dry-run=client"),
        ("kubectl delete pod x", "--dry-run=server"),
        ("helm upgrade api ./chart", "--dry-run"),
        ("argocd app sync api", "--dry-run"),
    ] {
        assert_eq!(
            classifier.classify(mutation),
            SecurityTier::Destructive,
            "{mutation}"
        );
        let simulated = format!("{mutation} {flag}");
        assert_eq!(
            classifier.classify(&simulated),
            SecurityTier::DryRun,
            "{simulated}"
        );
        let result = h.opsguard.validator().validate(&simulated);
        assert!(result.allowed, "{simulated}");
        assert!(!result.requires_approval(), "{simulated}");
    }
}

#[test]
fn disabled_dry_run_flag_does_not_downgrade() {
    let h = Harness::new();
    let classifier = h.opsguard.validator().classifier();
    for raw in [
        "kubectl apply -f x.yaml --dry-run=none",
        "kubectl apply -f x.yaml --dry-run=false",
    ] {
        assert_eq!(classifier.classify(raw), SecurityTier::Destructive, "{raw}");
    }
}

// ---------------------------------------------------------------------------
// Approval resolution
// ---------------------------------------------------------------------------

#[test]
fn only_the_exact_token_proceeds() {
    let h = Harness::new();
    let gate = h.opsguard.gate();

    for raw in ["approve", "  approve", "approve\n"] {
        let decision = gate.resolve(raw);
        assert!(decision.grants_proceed(), "{raw:?}");
        assert_eq!(decision.raw_response, raw);
    }

    for raw in [
        "Approve", "APPROVE", "approved", "approve it", "yes", "ok", "y", "lgtm", "", "   ",
    ] {
        let decision = gate.resolve(raw);
        assert_eq!(decision.action, ApprovalAction::Clarify, "{raw:?}");
        assert!(!decision.approved, "{raw:?}");
    }

    let decision = gate.resolve("reject");
    assert_eq!(decision.action, ApprovalAction::Abort);
    assert!(!decision.grants_proceed());
    assert_eq!(gate.resolve("Reject").action, ApprovalAction::Clarify);
}

// ---------------------------------------------------------------------------
// Approval guard
// ---------------------------------------------------------------------------

#[test]
fn approval_guard_matrix() {
    let policy = GuardPolicy::default();
    let proceed = ApprovalDecision::proceed("approve");
    let abort = ApprovalDecision::abort("reject");
    let clarify = ApprovalDecision::clarify("sure");
    let forged = ApprovalDecision {
        approved: true,
        action: ApprovalAction::Clarify,
        raw_response: "yes".to_owned(),
    };

    for tier in SecurityTier::ALL {
        for decision in [None, Some(&proceed), Some(&abort), Some(&clarify), Some(&forged)] {
            let outcome = policy.evaluate(&GuardArgs::Approval { tier, decision });
            let expected = tier != SecurityTier::Destructive
                || decision.is_some_and(ApprovalDecision::grants_proceed);
            assert_eq!(outcome.passed, expected, "{tier} with {decision:?}");
        }
    }
}
