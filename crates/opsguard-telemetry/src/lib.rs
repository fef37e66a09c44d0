//! Opsguard Telemetry - Logging setup for processes embedding opsguard.
//!
//! Every opsguard crate logs through `tracing` macros with structured fields.
//! This crate installs the subscriber that renders them: format, target,
//! per-crate directives and rotating log files.
//!
//! # Example
//!
//! ```rust,no_run
//! use opsguard_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), opsguard_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("opsguard_policy=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("opsguard ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
