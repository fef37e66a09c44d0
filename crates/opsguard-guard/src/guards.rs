//! Pure guard predicates, one per workflow-phase transition.
//!
//! Each guard takes small primitive inputs and returns a
//! [`GuardDecision`]. Guards never log, never fail and never consult
//! earlier outcomes; recording and enforcement live in
//! [`GuardEngine`](crate::GuardEngine).

use opsguard_core::{ApprovalDecision, RealizationPackage, SecurityTier, WorkflowPhase};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Guard names in phase order.
pub const GUARD_NAMES: [&str; 7] = [
    "phase_0_clarification",
    "phase_1_routing",
    "phase_2_context",
    "phase_3_planning",
    "phase_4_approval",
    "phase_5_realization",
    "phase_6_ssot_update",
];

/// The outcome of one guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardDecision {
    /// Whether the transition may happen.
    pub passed: bool,
    /// Why.
    pub reason: String,
}

impl GuardDecision {
    fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GuardDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed { "passed" } else { "failed" };
        write!(f, "{verdict}: {}", self.reason)
    }
}

/// Inputs for one guard. The variant selects the guard.
#[derive(Debug, Clone, Copy)]
pub enum GuardArgs<'a> {
    /// Phase 0: how ambiguous the request still is, in `0.0..=1.0`.
    Clarification {
        /// Ambiguity score.
        ambiguity: f64,
    },
    /// Phase 1: the routing choice.
    Routing {
        /// Router confidence in `0.0..=1.0`.
        confidence: f64,
        /// Selected execution unit.
        unit: &'a str,
    },
    /// Phase 2: loaded context sections by name.
    Context {
        /// Section name to content.
        payload: &'a Map<String, Value>,
    },
    /// Phase 3: the plan.
    Planning {
        /// Number of plan steps.
        steps: usize,
        /// Tier assigned to the plan, if it was classified.
        tier: Option<SecurityTier>,
    },
    /// Phase 4: the approval signal.
    Approval {
        /// Tier of the pending change set.
        tier: SecurityTier,
        /// The recorded decision, if any.
        decision: Option<&'a ApprovalDecision>,
    },
    /// Phase 5: the change set to realize.
    Realization {
        /// The package, if one was produced.
        package: Option<&'a RealizationPackage>,
    },
    /// Phase 6: the post-condition record.
    SsotUpdate {
        /// Tier of the realized change set.
        tier: SecurityTier,
        /// Whether the durable record was updated.
        ssot_updated: bool,
    },
}

impl GuardArgs<'_> {
    /// The phase this guard protects.
    #[must_use]
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            Self::Clarification { .. } => WorkflowPhase::Clarification,
            Self::Routing { .. } => WorkflowPhase::Routing,
            Self::Context { .. } => WorkflowPhase::Context,
            Self::Planning { .. } => WorkflowPhase::Planning,
            Self::Approval { .. } => WorkflowPhase::Approval,
            Self::Realization { .. } => WorkflowPhase::Realization,
            Self::SsotUpdate { .. } => WorkflowPhase::SsotUpdate,
        }
    }

    /// The guard's stable name (`phase_4_approval`, ...).
    #[must_use]
    pub fn guard_name(&self) -> &'static str {
        guard_name(self.phase())
    }
}

/// The guard name for a phase.
#[must_use]
pub fn guard_name(phase: WorkflowPhase) -> &'static str {
    GUARD_NAMES
        .get(usize::from(phase.index()))
        .copied()
        .unwrap_or("unknown")
}

/// Thresholds and registries the guards compare against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardPolicy {
    /// Highest ambiguity score that may leave clarification.
    pub ambiguity_threshold: f64,
    /// Lowest routing confidence that may leave routing.
    pub min_routing_confidence: f64,
    /// Execution units the router may select.
    pub registered_units: Vec<String>,
    /// Context sections that must be present and non-null.
    pub required_context_sections: Vec<String>,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            ambiguity_threshold: 0.3,
            min_routing_confidence: 0.7,
            registered_units: vec![
                "gitops".to_owned(),
                "infrastructure".to_owned(),
                "kubernetes".to_owned(),
                "release".to_owned(),
                "version-control".to_owned(),
            ],
            required_context_sections: vec!["task".to_owned(), "environment".to_owned()],
        }
    }
}

impl GuardPolicy {
    /// Run the guard selected by `args`.
    #[must_use]
    pub fn evaluate(&self, args: &GuardArgs<'_>) -> GuardDecision {
        match *args {
            GuardArgs::Clarification { ambiguity } => {
                clarification(ambiguity, self.ambiguity_threshold)
            },
            GuardArgs::Routing { confidence, unit } => routing(
                confidence,
                unit,
                self.min_routing_confidence,
                &self.registered_units,
            ),
            GuardArgs::Context { payload } => context(payload, &self.required_context_sections),
            GuardArgs::Planning { steps, tier } => planning(steps, tier),
            GuardArgs::Approval { tier, decision } => approval(tier, decision),
            GuardArgs::Realization { package } => realization(package),
            GuardArgs::SsotUpdate { tier, ssot_updated } => ssot_update(tier, ssot_updated),
        }
    }
}

/// Phase 0: the request is clear enough to route.
#[must_use]
pub fn clarification(ambiguity: f64, threshold: f64) -> GuardDecision {
    if ambiguity.is_nan() {
        return GuardDecision::fail("ambiguity score is not a number");
    }
    if ambiguity <= threshold {
        GuardDecision::pass(format!("ambiguity {ambiguity:.2} <= {threshold:.2}"))
    } else {
        GuardDecision::fail(format!(
            "ambiguity {ambiguity:.2} exceeds {threshold:.2}; clarify the request first"
        ))
    }
}

/// Phase 1: the router is confident and chose a registered unit.
#[must_use]
pub fn routing(confidence: f64, unit: &str, minimum: f64, registered: &[String]) -> GuardDecision {
    if confidence.is_nan() {
        return GuardDecision::fail("routing confidence is not a number");
    }
    if confidence < minimum {
        return GuardDecision::fail(format!(
            "routing confidence {confidence:.2} is below {minimum:.2}"
        ));
    }
    if !registered.iter().any(|known| known == unit) {
        return GuardDecision::fail(format!("unit {unit:?} is not registered"));
    }
    GuardDecision::pass(format!("routed to {unit} with confidence {confidence:.2}"))
}

/// Phase 2: every required context section is present and non-null.
#[must_use]
pub fn context(payload: &Map<String, Value>, required: &[String]) -> GuardDecision {
    let missing: Vec<&str> = required
        .iter()
        .filter(|section| payload.get(section.as_str()).is_none_or(Value::is_null))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        GuardDecision::pass(format!("{} required sections present", required.len()))
    } else {
        GuardDecision::fail(format!("missing context sections: {}", missing.join(", ")))
    }
}

/// Phase 3: a plan exists and its tier was classified.
#[must_use]
pub fn planning(steps: usize, tier: Option<SecurityTier>) -> GuardDecision {
    match (steps, tier) {
        (0, _) => GuardDecision::fail("plan has no steps"),
        (_, None) => GuardDecision::fail("plan tier was not classified"),
        (n, Some(tier)) => GuardDecision::pass(format!("plan with {n} steps at {tier}")),
    }
}

/// Phase 4: destructive change sets carry an explicit approval.
///
/// Only a decision that is both `approved` and `PROCEED` counts. A missing
/// decision is never read as consent.
#[must_use]
pub fn approval(tier: SecurityTier, decision: Option<&ApprovalDecision>) -> GuardDecision {
    if !tier.requires_approval() {
        return GuardDecision::pass(format!("approval not required at {tier}"));
    }
    match decision {
        Some(d) if d.grants_proceed() => GuardDecision::pass(format!("approved for {tier}")),
        Some(d) => GuardDecision::fail(format!(
            "{tier} requires explicit approval; got {} (approved={})",
            d.action, d.approved
        )),
        None => GuardDecision::fail(format!("{tier} requires explicit approval; none recorded")),
    }
}

/// Phase 5: there is something to realize.
#[must_use]
pub fn realization(package: Option<&RealizationPackage>) -> GuardDecision {
    match package {
        Some(p) if !p.is_empty() => GuardDecision::pass(format!(
            "{} files, {} VCS operations, {} resources",
            p.file_count(),
            p.vcs.len(),
            p.resources.len()
        )),
        Some(_) => GuardDecision::fail("realization package is empty"),
        None => GuardDecision::fail("no realization package"),
    }
}

/// Phase 6: destructive realizations were recorded durably.
#[must_use]
pub fn ssot_update(tier: SecurityTier, ssot_updated: bool) -> GuardDecision {
    if !tier.requires_approval() {
        GuardDecision::pass(format!("no record update required at {tier}"))
    } else if ssot_updated {
        GuardDecision::pass("record updated")
    } else {
        GuardDecision::fail(format!("{tier} realization was not recorded"))
    }
}
