//! Opsguard - a safety-control layer for operational shell commands.
//!
//! Commands issued by an automated orchestrator (cluster, infrastructure and
//! version-control tooling) are classified into security tiers, destructive
//! ones are gated behind a recorded human approval, and every realization
//! walks an ordered sequence of guarded workflow phases.
//!
//! This crate is the composition root: [`Opsguard`] builds every component
//! once from configuration and hands them out. The [`prelude`] re-exports
//! the per-crate preludes.
//!
//! # Example
//!
//! ```rust,no_run
//! use opsguard::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let guard = Opsguard::load(Some(std::path::Path::new(".")))?;
//!
//! let result = guard.validator().validate("kubectl get pods && terraform apply");
//! assert!(result.allowed);
//! assert_eq!(result.tier, SecurityTier::Destructive);
//!
//! let mut workflow = guard.workflow();
//! workflow.advance(GuardArgs::Clarification { ambiguity: 0.1 })?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod bridge;
pub mod error;
pub mod runtime;

pub use error::{OpsguardError, OpsguardResult};
pub use runtime::{Opsguard, RoutingOutcome, TaskRequest, TracingObserver};

pub use opsguard_approval as approval;
pub use opsguard_audit as audit;
pub use opsguard_config as config;
pub use opsguard_core as core;
pub use opsguard_guard as guard;
pub use opsguard_policy as policy;
pub use opsguard_telemetry as telemetry;

#[cfg(test)]
mod tests {
    use super::*;
    use opsguard_audit::MemoryAuditLog;
    use opsguard_config::Config;
    use opsguard_core::{SecurityTier, WorkflowPhase};
    use opsguard_guard::{GuardArgs, GuardError};
    use opsguard_policy::Delegation;
    use std::sync::Arc;

    fn opsguard(config: Config) -> (Opsguard, Arc<MemoryAuditLog>) {
        let log = Arc::new(MemoryAuditLog::new());
        let og = Opsguard::with_sink(config, log.clone()).unwrap();
        (og, log)
    }

    #[test]
    fn test_route_destructive_command_delegates() {
        let (og, _) = opsguard(Config::default());
        let outcome = og.route(&TaskRequest {
            command: "terraform apply".to_owned(),
            description: "apply the networking changes".to_owned(),
            files: vec!["infra/network.tf".to_owned()],
            ..Default::default()
        });
        assert!(outcome.validation.allowed);
        assert_eq!(outcome.validation.tier, SecurityTier::Destructive);
        assert_eq!(outcome.delegation.decision, Delegation::Delegate);
        assert_eq!(outcome.delegation.rule, "destructive_tier");
    }

    #[test]
    fn test_route_denied_command_is_blocked() {
        let (og, _) = opsguard(Config::default());
        let outcome = og.route(&TaskRequest {
            command: "rm -rf /".to_owned(),
            ..Default::default()
        });
        assert!(!outcome.validation.allowed);
        assert_eq!(outcome.delegation.decision, Delegation::Blocked);
    }

    #[test]
    fn test_route_read_only_single_file_stays_local() {
        let (og, _) = opsguard(Config::default());
        let outcome = og.route(&TaskRequest {
            command: "cat README.md".to_owned(),
            description: "show the readme".to_owned(),
            files: vec!["README.md".to_owned()],
            ..Default::default()
        });
        assert_eq!(outcome.validation.tier, SecurityTier::ReadOnly);
        assert_eq!(outcome.delegation.decision, Delegation::Local);
    }

    #[test]
    fn test_workflows_are_independent() {
        let (og, _) = opsguard(Config::default());
        let mut first = og.workflow();
        first.advance(GuardArgs::Clarification { ambiguity: 0.1 }).unwrap();
        let second = og.workflow();
        assert_eq!(first.current_phase(), Some(WorkflowPhase::Routing));
        assert_eq!(second.current_phase(), Some(WorkflowPhase::Clarification));
        assert!(second.engine().history().is_empty());
    }

    #[test]
    fn test_enforcement_follows_config() {
        let mut config = Config::default();
        config.guards.enforce = false;
        let (og, _) = opsguard(config);
        let mut engine = og.guard_engine();
        let decision = engine
            .enforce(GuardArgs::Approval {
                tier: SecurityTier::Destructive,
                decision: None,
            })
            .unwrap();
        assert!(!decision.passed);

        let (strict, _) = opsguard(Config::default());
        let mut engine = strict.guard_engine();
        assert!(matches!(
            engine.enforce(GuardArgs::Approval {
                tier: SecurityTier::Destructive,
                decision: None,
            }),
            Err(GuardError::Violation { .. })
        ));
    }

    #[test]
    fn test_invalid_policy_config_fails_to_build() {
        let mut config = Config::default();
        config.policy.extra_denylist = vec!["(unclosed".to_owned()];
        let log = Arc::new(MemoryAuditLog::new());
        assert!(matches!(
            Opsguard::with_sink(config, log),
            Err(OpsguardError::Policy(_))
        ));
    }

    #[test]
    fn test_init_logging_rejects_bad_directive() {
        let mut config = Config::default();
        config.logging.directives = vec!["opsguard_policy=[[[".to_owned()];
        assert!(matches!(
            Opsguard::init_logging(&config),
            Err(OpsguardError::Telemetry(_))
        ));
    }

    #[test]
    fn test_from_resolved_writes_to_audit_dir() {
        let home = tempfile::tempdir().unwrap();
        let resolved = Config::load_with_home(None, home.path()).unwrap();
        let og = Opsguard::from_resolved(&resolved).unwrap();

        let package = opsguard_core::RealizationPackage::default();
        let decision = og.gate().resolve("reject");
        let outcome = og
            .gate()
            .record(&package, "reject", &decision, "carol", WorkflowPhase::Approval);
        assert!(outcome.persisted);
        assert!(home.path().join("audit").is_dir());
    }
}
