//! Per-invocation workflow bookkeeping.

use std::fmt;

use chrono::{DateTime, Utc};
use domain::{OrderId, ResourceId, RunId};
use serde::{Deserialize, Serialize};

use crate::services::ReservationId;
use crate::state::{RunOutcome, WorkflowState};

/// The ordered steps of an executing workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    PlaceOrder,
    Reserve(ResourceId),
    Persist,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::PlaceOrder => f.write_str("place_order"),
            StepKind::Reserve(resource_id) => write!(f, "reserve:{resource_id}"),
            StepKind::Persist => f.write_str("persist"),
        }
    }
}

/// How to undo a completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compensation {
    ReleaseReservation(ReservationId),
    /// The step had no external effect.
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedStep {
    pub step: StepKind,
    pub compensation: Compensation,
    pub completed_at: DateTime<Utc>,
}

/// One `execute` call's state machine and undo stack.
///
/// A run is owned by the task executing it and never shared.
#[derive(Debug)]
pub struct WorkflowRun {
    id: RunId,
    request_id: OrderId,
    state: WorkflowState,
    history: Vec<WorkflowState>,
    steps: Vec<CompletedStep>,
}

impl WorkflowRun {
    /// Starts a run for `request_id` in the `Started` state.
    pub fn start(request_id: OrderId) -> Self {
        Self {
            id: RunId::new(),
            request_id,
            state: WorkflowState::Started,
            history: vec![WorkflowState::Started],
            steps: Vec::new(),
        }
    }

    /// Returns the run id.
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Returns the id of the request being driven.
    pub fn request_id(&self) -> OrderId {
        self.request_id
    }

    /// Returns the current state.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Every state the run has been in, oldest first.
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    /// Returns the outcome implied by the current state.
    pub fn outcome(&self) -> RunOutcome {
        self.state.outcome()
    }

    /// Moves to `next`. The coordinator only requests legal edges; an
    /// illegal one is logged and ignored.
    pub fn advance(&mut self, next: WorkflowState) {
        match self.state.transition(next) {
            Ok(state) => {
                tracing::debug!(run_id = %self.id, from = %self.state, to = %state, "workflow transition");
                self.state = state;
                self.history.push(state);
            }
            Err(e) => {
                tracing::error!(run_id = %self.id, error = %e, "illegal workflow transition");
                debug_assert!(false, "{e}");
            }
        }
    }

    /// Pushes a completed step onto the undo stack.
    pub fn record(&mut self, step: StepKind, compensation: Compensation) {
        self.steps.push(CompletedStep {
            step,
            compensation,
            completed_at: Utc::now(),
        });
    }

    /// Returns the completed steps in execution order.
    pub fn steps(&self) -> &[CompletedStep] {
        &self.steps
    }

    /// Reservations acquired so far, in acquisition order.
    pub fn reservation_ids(&self) -> Vec<ReservationId> {
        self.steps
            .iter()
            .filter_map(|s| match &s.compensation {
                Compensation::ReleaseReservation(id) => Some(id.clone()),
                Compensation::Nothing => None,
            })
            .collect()
    }

    /// Drains the undo stack, most recent step first.
    pub fn take_compensations(&mut self) -> Vec<CompletedStep> {
        let mut steps = std::mem::take(&mut self.steps);
        steps.reverse();
        steps
    }

    /// Empties the undo stack once its effects are permanent.
    pub fn seal(&mut self) {
        self.steps.clear();
    }
}
