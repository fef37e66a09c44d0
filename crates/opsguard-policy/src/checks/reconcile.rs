//! Reconciliation-only policy for GitOps acting units.

use std::sync::Arc;

use super::{CheckOutcome, CheckStage, CommandCheck, Rejection};
use crate::command::ParsedCommand;
use crate::patterns::{Domain, PatternTable};
use crate::suggest::GITOPS_ADVICE;

/// Domains whose forbidden rules describe live cluster mutations.
const CLUSTER_DOMAINS: [Domain; 3] = [Domain::Kubernetes, Domain::Release, Domain::Gitops];

/// Forbids every mutating cluster verb unless it is simulated.
///
/// Units listed here reach the cluster only through the GitOps controller,
/// so even verbs the generic classifier would allow after approval are
/// refused. What counts as mutating comes from the cluster domains'
/// forbidden rules, which already see past global flags such as
/// `-n prod --context c1`.
#[derive(Debug, Clone)]
pub struct ReconciliationCheck {
    table: Arc<PatternTable>,
    units: Vec<String>,
}

impl ReconciliationCheck {
    /// Create a check active for the given acting-unit types.
    #[must_use]
    pub fn new(table: Arc<PatternTable>, units: &[String]) -> Self {
        Self {
            table,
            units: units.iter().map(|u| u.trim().to_ascii_lowercase()).collect(),
        }
    }
}

impl CommandCheck for ReconciliationCheck {
    fn name(&self) -> &'static str {
        "reconciliation_only"
    }

    fn stage(&self) -> CheckStage {
        CheckStage::Workflow
    }

    fn applies_to(&self, unit: Option<&str>) -> bool {
        unit.is_some_and(|u| {
            let u = u.trim().to_ascii_lowercase();
            self.units.iter().any(|known| *known == u)
        })
    }

    fn check(&self, cmd: &ParsedCommand) -> CheckOutcome {
        if cmd.has_dry_run_flag() {
            return CheckOutcome::Pass;
        }
        let Some(hit) = self
            .table
            .matches_forbidden(cmd)
            .filter(|hit| CLUSTER_DOMAINS.iter().any(|d| d.name() == hit.category))
        else {
            return CheckOutcome::Pass;
        };
        CheckOutcome::Reject(Rejection {
            reason: format!(
                "`{}` would {}; reconciliation units may only simulate changes",
                cmd.program(),
                hit.description
            ),
            category: "gitops".to_owned(),
            suggestions: vec![
                format!("Preview with `{} --dry-run=server`", cmd.raw()),
                GITOPS_ADVICE.to_owned(),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PolicySettings;

    fn check() -> ReconciliationCheck {
        let table = PatternTable::new(&PolicySettings::default()).unwrap();
        ReconciliationCheck::new(Arc::new(table), &["gitops".to_owned()])
    }

    #[test]
    fn test_applies_only_to_configured_units() {
        let check = check();
        assert!(check.applies_to(Some("gitops")));
        assert!(check.applies_to(Some(" GitOps ")));
        assert!(!check.applies_to(Some("infra")));
        assert!(!check.applies_to(None));
    }

    #[test]
    fn test_rejects_unsimulated_mutations() {
        let check = check();
        for raw in [
            "kubectl apply -f deploy.yaml",
            "kubectl -n prod rollout restart deploy/api",
            "helm upgrade api ./chart",
            "argocd app sync api",
            "flux reconcile kustomization apps",
            "kubectl run debug --image=busybox",
            "kubectl exec api-0 -- rm -rf /data",
            "kubectl exec api-0 -- rm -rf /data --dry-run",
            "kubectl cp ./dump api-0:/tmp",
            "kubectl expose deploy api --port=80",
            "kubectl -n prod --context c1 --cluster k1 delete pod api-0",
            "kubectl --kubeconfig /tmp/k -n prod scale deploy/api --replicas=0",
            "flux bootstrap github --owner=x",
            "helmfile sync",
        ] {
            let outcome = check.check(&ParsedCommand::parse(raw));
            let CheckOutcome::Reject(rejection) = outcome else {
                panic!("expected rejection for {raw}, got {outcome:?}");
            };
            assert_eq!(rejection.category, "gitops", "{raw}");
        }
    }

    #[test]
    fn test_allows_reads_and_simulations() {
        let check = check();
        for raw in [
            "kubectl get pods",
            "kubectl apply -f deploy.yaml --dry-run=server",
            "helm upgrade api ./chart --dry-run",
            "argocd app diff api",
            "kubectl -n prod --context c1 get pods",
            "flux get kustomizations",
            "terraform apply",
        ] {
            assert_eq!(check.check(&ParsedCommand::parse(raw)), CheckOutcome::Pass, "{raw}");
        }
    }
}
