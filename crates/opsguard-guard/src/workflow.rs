//! The sequential workflow state machine.
//!
//! A [`Workflow`] starts in CLARIFICATION and accepts only the guard for its
//! current phase. A passing guard moves it to the next phase, and the SSOT
//! guard completes it. A failing guard halts it for good.

use opsguard_core::WorkflowPhase;
use serde::Serialize;
use tracing::info;

use crate::engine::GuardEngine;
use crate::error::{GuardError, GuardResult};
use crate::guards::GuardArgs;

/// Where a workflow stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    /// Waiting for the guard of this phase.
    Active {
        /// The current phase.
        phase: WorkflowPhase,
    },
    /// A guard failed; terminal.
    Halted {
        /// Phase whose guard failed.
        phase: WorkflowPhase,
        /// The failure reason.
        reason: String,
    },
    /// Every phase passed; terminal.
    Completed,
}

/// One workflow run driven through its phase guards.
#[derive(Debug, Clone)]
pub struct Workflow {
    engine: GuardEngine,
    state: WorkflowState,
}

impl Workflow {
    /// Start a run in CLARIFICATION.
    #[must_use]
    pub fn new(engine: GuardEngine) -> Self {
        Self {
            engine,
            state: WorkflowState::Active {
                phase: WorkflowPhase::Clarification,
            },
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// The phase awaiting its guard, if the run is still active.
    #[must_use]
    pub fn current_phase(&self) -> Option<WorkflowPhase> {
        match self.state {
            WorkflowState::Active { phase } => Some(phase),
            _ => None,
        }
    }

    /// The engine holding this run's guard history.
    #[must_use]
    pub fn engine(&self) -> &GuardEngine {
        &self.engine
    }

    /// Present the guard for the current phase.
    ///
    /// # Errors
    ///
    /// - [`GuardError::Halted`] or [`GuardError::Completed`] if the run is over
    /// - [`GuardError::OutOfOrder`] if `args` guards a different phase
    /// - [`GuardError::Violation`] if the guard fails under strict
    ///   enforcement; the run is halted either way
    pub fn advance(&mut self, args: GuardArgs<'_>) -> GuardResult<&WorkflowState> {
        let current = match &self.state {
            WorkflowState::Active { phase } => *phase,
            WorkflowState::Halted { phase, reason } => {
                return Err(GuardError::Halted {
                    phase: *phase,
                    reason: reason.clone(),
                });
            },
            WorkflowState::Completed => return Err(GuardError::Completed),
        };
        if args.phase() != current {
            return Err(GuardError::OutOfOrder {
                expected: current,
                actual: args.phase(),
            });
        }

        let decision = match self.engine.enforce(args) {
            Ok(decision) => decision,
            Err(err) => {
                if let GuardError::Violation { reason, .. } = &err {
                    self.halt(current, reason.clone());
                }
                return Err(err);
            },
        };

        if decision.passed {
            self.state = match current.next() {
                Some(phase) => WorkflowState::Active { phase },
                None => WorkflowState::Completed,
            };
            info!(from = %current, state = ?self.state, "Workflow advanced");
        } else {
            self.halt(current, decision.reason);
        }
        Ok(&self.state)
    }

    fn halt(&mut self, phase: WorkflowPhase, reason: String) {
        info!(phase = %phase, reason = %reason, "Workflow halted");
        self.state = WorkflowState::Halted { phase, reason };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Enforcement;
    use crate::guards::GuardPolicy;
    use opsguard_core::{ApprovalDecision, FileAction, FileChange, RealizationPackage, SecurityTier};
    use serde_json::json;

    fn workflow(enforcement: Enforcement) -> Workflow {
        Workflow::new(GuardEngine::new(GuardPolicy::default(), enforcement))
    }

    #[test]
    fn test_full_run_completes() {
        let mut wf = workflow(Enforcement::Strict);
        let payload = json!({"task": "scale api", "environment": "prod"});
        let approved = ApprovalDecision::proceed("approve");
        let package = RealizationPackage {
            files: vec![FileChange::new("apps/api.yaml", FileAction::Modify)],
            ..RealizationPackage::default()
        };
        let t3 = SecurityTier::Destructive;

        wf.advance(GuardArgs::Clarification { ambiguity: 0.1 }).unwrap();
        wf.advance(GuardArgs::Routing {
            confidence: 0.9,
            unit: "gitops",
        })
        .unwrap();
        wf.advance(GuardArgs::Context {
            payload: payload.as_object().unwrap(),
        })
        .unwrap();
        wf.advance(GuardArgs::Planning {
            steps: 2,
            tier: Some(t3),
        })
        .unwrap();
        wf.advance(GuardArgs::Approval {
            tier: t3,
            decision: Some(&approved),
        })
        .unwrap();
        wf.advance(GuardArgs::Realization {
            package: Some(&package),
        })
        .unwrap();
        let state = wf
            .advance(GuardArgs::SsotUpdate {
                tier: t3,
                ssot_updated: true,
            })
            .unwrap();
        assert_eq!(*state, WorkflowState::Completed);
        assert_eq!(wf.engine().history().len(), 7);
        assert_eq!(
            wf.advance(GuardArgs::Clarification { ambiguity: 0.0 }),
            Err(GuardError::Completed)
        );
    }

    #[test]
    fn test_phases_cannot_be_skipped() {
        let mut wf = workflow(Enforcement::Strict);
        let approved = ApprovalDecision::proceed("approve");
        let err = wf
            .advance(GuardArgs::Approval {
                tier: SecurityTier::Destructive,
                decision: Some(&approved),
            })
            .unwrap_err();
        assert_eq!(err, GuardError::OutOfOrder {
            expected: WorkflowPhase::Clarification,
            actual: WorkflowPhase::Approval,
        });
        assert_eq!(wf.current_phase(), Some(WorkflowPhase::Clarification));
        assert!(wf.engine().history().is_empty());
    }

    #[test]
    fn test_strict_failure_halts_and_raises() {
        let mut wf = workflow(Enforcement::Strict);
        let err = wf
            .advance(GuardArgs::Clarification { ambiguity: 0.9 })
            .unwrap_err();
        assert!(matches!(err, GuardError::Violation { .. }));
        assert!(matches!(wf.state(), WorkflowState::Halted { .. }));
        assert!(matches!(
            wf.advance(GuardArgs::Clarification { ambiguity: 0.0 }),
            Err(GuardError::Halted { .. })
        ));
    }

    #[test]
    fn test_observe_only_failure_halts_without_error() {
        let mut wf = workflow(Enforcement::ObserveOnly);
        let state = wf
            .advance(GuardArgs::Clarification { ambiguity: 0.9 })
            .unwrap()
            .clone();
        assert!(matches!(state, WorkflowState::Halted {
            phase: WorkflowPhase::Clarification,
            ..
        }));
    }
}
