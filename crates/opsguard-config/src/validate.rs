//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
/// Formats accepted by `logging.format`.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];
/// Periods accepted by `approval.audit_period`.
pub const AUDIT_PERIODS: &[&str] = &["daily", "monthly", "none"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_policy(config)?;
    validate_guards(config)?;
    validate_approval(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_policy(config: &Config) -> ConfigResult<()> {
    let p = &config.policy;
    if p.protected_branches.iter().any(|b| b.trim().is_empty()) {
        return Err(invalid(
            "policy.protected_branches",
            "branch names must not be empty",
        ));
    }
    if p.extra_denylist.iter().any(|d| d.trim().is_empty()) {
        return Err(invalid(
            "policy.extra_denylist",
            "an empty pattern would match every command",
        ));
    }
    if p.forbidden_commit_trailers.iter().any(|t| t.trim().is_empty()) {
        return Err(invalid(
            "policy.forbidden_commit_trailers",
            "an empty trailer prefix would strip every line",
        ));
    }
    Ok(())
}

fn validate_guards(config: &Config) -> ConfigResult<()> {
    let g = &config.guards;
    for (field, value) in [
        ("guards.ambiguity_threshold", g.ambiguity_threshold),
        ("guards.min_routing_confidence", g.min_routing_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(
                field,
                format!("{value} is out of range; must be between 0.0 and 1.0"),
            ));
        }
    }
    if g.registered_units.is_empty() {
        return Err(invalid(
            "guards.registered_units",
            "at least one execution unit must be registered",
        ));
    }
    Ok(())
}

fn validate_approval(config: &Config) -> ConfigResult<()> {
    let a = &config.approval;
    for (field, token) in [
        ("approval.approve_token", &a.approve_token),
        ("approval.reject_token", &a.reject_token),
    ] {
        if token.trim().is_empty() || token.trim() != token {
            return Err(invalid(
                field,
                "must be non-empty without surrounding whitespace",
            ));
        }
    }
    if a.approve_token == a.reject_token {
        return Err(invalid(
            "approval.reject_token",
            "must differ from approval.approve_token",
        ));
    }
    if a.max_files_shown == 0 {
        return Err(invalid("approval.max_files_shown", "must be at least 1"));
    }
    if a.max_resources_per_group == 0 {
        return Err(invalid(
            "approval.max_resources_per_group",
            "must be at least 1",
        ));
    }
    if a.audit_prefix.is_empty()
        || a.audit_prefix.contains(['/', '\\'])
        || a.audit_prefix.starts_with('.')
    {
        return Err(invalid(
            "approval.audit_prefix",
            "must be a plain file name prefix",
        ));
    }
    if !AUDIT_PERIODS.contains(&a.audit_period.as_str()) {
        return Err(invalid(
            "approval.audit_period",
            format!(
                "unsupported period '{}'; expected one of: {}",
                a.audit_period,
                AUDIT_PERIODS.join(", ")
            ),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    if !LOG_LEVELS.contains(&l.level.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported level '{}'; expected one of: {}",
                l.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if !LOG_FORMATS.contains(&l.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}
