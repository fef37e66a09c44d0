//! The assembled opsguard instance.
//!
//! Every component is built once, here, and handed out by reference. There
//! are no global registries: a process that needs two differently configured
//! instances simply builds two.

use opsguard_approval::ApprovalGate;
use opsguard_audit::{AuditSink, JsonlAuditLog};
use opsguard_config::{Config, ResolvedConfig};
use opsguard_guard::{Enforcement, GuardEngine, GuardPolicy, Workflow};
use opsguard_policy::{
    CommandValidator, DelegationConditions, DelegationDecision, DelegationMatrix,
    ValidationObserver, ValidationRecord, ValidationResult,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::bridge;
use crate::error::OpsguardResult;

/// Validation observer that emits each record as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ValidationObserver for TracingObserver {
    fn record(&self, record: &ValidationRecord) {
        debug!(
            tier = %record.tier,
            allowed = record.allowed,
            duration_micros = record.duration_micros,
            atomic_count = record.atomic_count,
            "Command validated"
        );
    }
}

/// A task as submitted by the orchestrator for routing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRequest {
    /// The shell command the task will run.
    pub command: String,
    /// Free-form task description, scanned for domain and approval keywords.
    pub description: String,
    /// Files the task touches.
    pub files: Vec<String>,
    /// Acting-unit type, selecting stricter sub-policies.
    pub unit: Option<String>,
    /// The caller already named a target unit.
    pub routing_metadata: bool,
    /// The task needs loaded context.
    pub context_required: bool,
}

/// Validation and routing outcome for one task.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingOutcome {
    /// The command validator's verdict.
    pub validation: ValidationResult,
    /// Where the task goes.
    pub delegation: DelegationDecision,
}

/// All opsguard components, built from one configuration.
#[derive(Debug)]
pub struct Opsguard {
    config: Config,
    validator: CommandValidator,
    delegation: DelegationMatrix,
    guard_policy: GuardPolicy,
    enforcement: Enforcement,
    gate: ApprovalGate,
}

impl Opsguard {
    /// Load configuration for `workspace_root` and build every component.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails to load or a component
    /// rejects its settings.
    pub fn load(workspace_root: Option<&Path>) -> OpsguardResult<Self> {
        let resolved = Config::load(workspace_root)?;
        Self::from_resolved(&resolved)
    }

    /// Build from a resolved configuration, writing approvals to the
    /// configured JSON-Lines audit directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a component rejects its settings.
    pub fn from_resolved(resolved: &ResolvedConfig) -> OpsguardResult<Self> {
        let config = &resolved.config;
        let sink = JsonlAuditLog::new(
            resolved.audit_dir(),
            config.approval.audit_prefix.clone(),
            bridge::audit_period(config)?,
        );
        info!(
            audit_dir = %sink.dir().display(),
            enforce = config.guards.enforce,
            "Assembling opsguard"
        );
        Self::with_sink(config.clone(), Arc::new(sink))
    }

    /// Install the global `tracing` subscriber described by `[logging]`.
    ///
    /// Call once at process start, before building an instance.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid level, format or directive, or when a
    /// subscriber is already installed.
    pub fn init_logging(config: &Config) -> OpsguardResult<()> {
        opsguard_telemetry::setup_logging(&bridge::log_config(config)?)?;
        Ok(())
    }

    /// Build from a configuration and an explicit audit sink.
    ///
    /// # Errors
    ///
    /// Returns an error if a component rejects its settings.
    pub fn with_sink(config: Config, sink: Arc<dyn AuditSink>) -> OpsguardResult<Self> {
        let validator = CommandValidator::new(&bridge::policy_settings(&config))?
            .with_observer(Arc::new(TracingObserver));
        let (guard_policy, enforcement) = bridge::guard_policy(&config);
        let gate = ApprovalGate::new(bridge::approval_settings(&config), sink)?;
        Ok(Self {
            config,
            validator,
            delegation: DelegationMatrix,
            guard_policy,
            enforcement,
            gate,
        })
    }

    /// The configuration this instance was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The command validator.
    #[must_use]
    pub fn validator(&self) -> &CommandValidator {
        &self.validator
    }

    /// The approval gate.
    #[must_use]
    pub fn gate(&self) -> &ApprovalGate {
        &self.gate
    }

    /// The configured enforcement mode.
    #[must_use]
    pub fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    /// A fresh guard engine with empty history, owned by the caller.
    #[must_use]
    pub fn guard_engine(&self) -> GuardEngine {
        GuardEngine::new(self.guard_policy.clone(), self.enforcement)
    }

    /// A fresh workflow at the first phase, owned by the caller.
    #[must_use]
    pub fn workflow(&self) -> Workflow {
        Workflow::new(self.guard_engine())
    }

    /// Validate the task's command and decide where the task runs.
    #[must_use]
    pub fn route(&self, task: &TaskRequest) -> RoutingOutcome {
        let validation = self
            .validator
            .validate_as(&task.command, task.unit.as_deref());
        let conditions = DelegationConditions {
            validation_denied: !validation.allowed,
            routing_metadata: task.routing_metadata,
            tier: validation.tier,
            files: task.files.clone(),
            context_required: task.context_required,
            compound: validation.commands.len() > 1,
            requires_credentials: validation.requires_credentials,
            ..Default::default()
        }
        .with_keywords_from(&format!("{} {}", task.description, task.command));
        let delegation = self.delegation.decide(&conditions);
        RoutingOutcome {
            validation,
            delegation,
        }
    }
}
