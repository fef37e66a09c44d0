//! Conversion from configuration sections to domain settings.

use opsguard_approval::ApprovalSettings;
use opsguard_audit::AuditPeriod;
use opsguard_config::Config;
use opsguard_guard::{Enforcement, GuardPolicy};
use opsguard_policy::PolicySettings;
use opsguard_telemetry::{LogConfig, LogFormat};

use crate::error::{OpsguardError, OpsguardResult};

/// `[policy]` as policy-engine settings.
#[must_use]
pub fn policy_settings(config: &Config) -> PolicySettings {
    let p = &config.policy;
    PolicySettings {
        protected_branches: p.protected_branches.clone(),
        extra_denylist: p.extra_denylist.clone(),
        forbidden_commit_trailers: p.forbidden_commit_trailers.clone(),
        require_conventional_commits: p.require_conventional_commits,
        reconciliation_units: p.reconciliation_units.clone(),
    }
}

/// `[guards]` as guard thresholds and enforcement mode.
#[must_use]
pub fn guard_policy(config: &Config) -> (GuardPolicy, Enforcement) {
    let g = &config.guards;
    let policy = GuardPolicy {
        ambiguity_threshold: g.ambiguity_threshold,
        min_routing_confidence: g.min_routing_confidence,
        registered_units: g.registered_units.clone(),
        required_context_sections: g.required_context_sections.clone(),
    };
    (policy, Enforcement::from_flag(g.enforce))
}

/// `[approval]` as approval-gate settings.
#[must_use]
pub fn approval_settings(config: &Config) -> ApprovalSettings {
    let a = &config.approval;
    ApprovalSettings {
        approve_token: a.approve_token.clone(),
        reject_token: a.reject_token.clone(),
        max_files_shown: a.max_files_shown,
        max_resources_per_group: a.max_resources_per_group,
    }
}

/// `approval.audit_period` as an audit file grouping.
///
/// # Errors
///
/// Returns an error for an unknown period name.
pub fn audit_period(config: &Config) -> OpsguardResult<AuditPeriod> {
    match config.approval.audit_period.as_str() {
        "daily" => Ok(AuditPeriod::Daily),
        "monthly" => Ok(AuditPeriod::Monthly),
        "none" => Ok(AuditPeriod::None),
        other => Err(OpsguardError::InvalidSetting {
            field: "approval.audit_period",
            message: format!("unknown period '{other}'"),
        }),
    }
}

/// `[logging]` as a subscriber configuration writing to stderr.
///
/// # Errors
///
/// Returns an error for an unknown log format.
pub fn log_config(config: &Config) -> OpsguardResult<LogConfig> {
    let l = &config.logging;
    let format: LogFormat = l.format.parse()?;
    Ok(LogConfig::new(l.level.to_ascii_lowercase())
        .with_format(format)
        .with_directives(l.directives.iter().cloned()))
}
