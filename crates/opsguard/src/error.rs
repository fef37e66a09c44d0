use thiserror::Error;

/// Errors raised while assembling opsguard from configuration.
#[derive(Debug, Error)]
pub enum OpsguardError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] opsguard_config::ConfigError),

    /// Policy tables could not be built.
    #[error(transparent)]
    Policy(#[from] opsguard_policy::PolicyError),

    /// Approval gate settings are invalid.
    #[error(transparent)]
    Approval(#[from] opsguard_approval::ApprovalError),

    /// Logging could not be configured.
    #[error(transparent)]
    Telemetry(#[from] opsguard_telemetry::TelemetryError),

    /// A configuration value has no domain equivalent.
    #[error("invalid setting '{field}': {message}")]
    InvalidSetting {
        /// Dotted config path.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Result type for assembling opsguard.
pub type OpsguardResult<T> = Result<T, OpsguardError>;
