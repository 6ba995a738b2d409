//! Workflow state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The state of one workflow invocation.
///
/// State transitions:
/// ```text
/// Started ──► Validating ──┬──► Rejected
///                          ├──► Failed            (malformed request or facts unresolved)
///                          └──► Executing ──┬──► Committed
///                                           └──► Compensating ──┬──► RolledBack
///                                                               └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowState {
    /// The run exists but nothing has been looked at yet.
    #[default]
    Started,

    /// Facts are being resolved and the policy evaluated.
    Validating,

    /// The policy said no (terminal, no side effects).
    Rejected,

    /// Side-effecting steps are in progress.
    Executing,

    /// A step failed and completed steps are being undone.
    Compensating,

    /// Every step is durable (terminal).
    Committed,

    /// Every completed step was undone (terminal).
    RolledBack,

    /// The run could not complete or could not be fully undone (terminal).
    Failed,
}

/// Raised when a run is driven through an edge the state machine lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid workflow transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: WorkflowState,
    pub to: WorkflowState,
}

impl WorkflowState {
    /// Returns true if the state machine has an edge to `next`.
    pub fn can_transition_to(&self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Started, Validating)
                | (Validating, Rejected)
                | (Validating, Executing)
                | (Validating, Failed)
                | (Executing, Committed)
                | (Executing, Compensating)
                | (Compensating, RolledBack)
                | (Compensating, Failed)
        )
    }

    /// Returns `next` if the edge exists.
    pub fn transition(self, next: WorkflowState) -> Result<WorkflowState, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Rejected
                | WorkflowState::Committed
                | WorkflowState::RolledBack
                | WorkflowState::Failed
        )
    }

    /// Maps the state onto the caller-facing outcome.
    pub fn outcome(&self) -> RunOutcome {
        match self {
            WorkflowState::Committed => RunOutcome::Committed,
            WorkflowState::RolledBack => RunOutcome::RolledBack,
            WorkflowState::Rejected => RunOutcome::Rejected,
            WorkflowState::Failed => RunOutcome::Failed,
            _ => RunOutcome::Pending,
        }
    }

    /// Returns the state name used in logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Started => "Started",
            WorkflowState::Validating => "Validating",
            WorkflowState::Rejected => "Rejected",
            WorkflowState::Executing => "Executing",
            WorkflowState::Compensating => "Compensating",
            WorkflowState::Committed => "Committed",
            WorkflowState::RolledBack => "RolledBack",
            WorkflowState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The coarse result of a run, as seen by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Pending,
    Committed,
    RolledBack,
    Rejected,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowState::*;

    const ALL: [WorkflowState; 8] = [
        Started,
        Validating,
        Rejected,
        Executing,
        Compensating,
        Committed,
        RolledBack,
        Failed,
    ];

    #[test]
    fn test_default_state_is_started() {
        assert_eq!(WorkflowState::default(), Started);
    }

    #[test]
    fn test_happy_path_edges() {
        assert_eq!(Started.transition(Validating), Ok(Validating));
        assert_eq!(Validating.transition(Executing), Ok(Executing));
        assert_eq!(Executing.transition(Committed), Ok(Committed));
    }

    #[test]
    fn test_compensation_edges() {
        assert!(Executing.can_transition_to(Compensating));
        assert!(Compensating.can_transition_to(RolledBack));
        assert!(Compensating.can_transition_to(Failed));
        assert!(!Compensating.can_transition_to(Committed));
    }

    #[test]
    fn test_rejection_skips_execution() {
        assert!(Validating.can_transition_to(Rejected));
        assert!(!Executing.can_transition_to(Rejected));
        assert!(!Started.can_transition_to(Executing));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(WorkflowState::is_terminal) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_invalid_transition_reports_both_ends() {
        let err = Committed.transition(Compensating).unwrap_err();
        assert_eq!(err.from, Committed);
        assert_eq!(err.to, Compensating);
        assert_eq!(
            err.to_string(),
            "Invalid workflow transition: Committed -> Compensating"
        );
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(Started.outcome(), RunOutcome::Pending);
        assert_eq!(Compensating.outcome(), RunOutcome::Pending);
        assert_eq!(Committed.outcome(), RunOutcome::Committed);
        assert_eq!(RolledBack.outcome(), RunOutcome::RolledBack);
        assert_eq!(Rejected.outcome(), RunOutcome::Rejected);
        assert_eq!(Failed.outcome(), RunOutcome::Failed);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Compensating).unwrap();
        let back: WorkflowState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Compensating);
    }
}
