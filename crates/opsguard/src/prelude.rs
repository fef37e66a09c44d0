//! Unified prelude - every per-crate prelude plus the composition root.
//!
//! Use `use opsguard::prelude::*;` to import all commonly used types.

pub use opsguard_approval::prelude::*;
pub use opsguard_audit::prelude::*;
pub use opsguard_core::prelude::*;
pub use opsguard_guard::prelude::*;
pub use opsguard_policy::prelude::*;
pub use opsguard_telemetry::prelude::*;

pub use opsguard_config::{Config, ConfigError, ConfigResult, ResolvedConfig};

pub use crate::{Opsguard, OpsguardError, OpsguardResult, RoutingOutcome, TaskRequest};
