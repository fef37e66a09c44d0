//! Prelude module - commonly used types for convenient import.
//!
//! Use `use opsguard_telemetry::prelude::*;` to import all essential types.

pub use crate::{TelemetryError, TelemetryResult};

pub use crate::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
