//! Workflow error types.

use std::collections::BTreeMap;
use std::fmt;

use domain::{DomainError, OrderId, RunId};
use policy::{PolicyReport, PresetName};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an executing workflow stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    FactsNotFound,
    FactsUnavailable,
    ResourceUnavailable,
    PersistenceFailure,
    Cancelled,
    TimedOut,
}

impl ExecutionErrorKind {
    /// Returns the snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionErrorKind::FactsNotFound => "facts_not_found",
            ExecutionErrorKind::FactsUnavailable => "facts_unavailable",
            ExecutionErrorKind::ResourceUnavailable => "resource_unavailable",
            ExecutionErrorKind::PersistenceFailure => "persistence_failure",
            ExecutionErrorKind::Cancelled => "cancelled",
            ExecutionErrorKind::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A policy rejection: the request was refused before any side effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub request_id: OrderId,
    pub preset: PresetName,
    pub reasons: Vec<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub report: PolicyReport,
}

impl Rejection {
    /// Builds a rejection from a failed report, summarizing it as metadata.
    pub fn new(request_id: OrderId, preset: PresetName, report: PolicyReport) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("preset".to_string(), preset.as_str().into());
        metadata.insert(
            "confidence_score".to_string(),
            report.confidence_score.into(),
        );
        metadata.insert(
            "critical_failure".to_string(),
            report.critical_failure.into(),
        );
        metadata.insert(
            "failed_rules".to_string(),
            report
                .failed_rules()
                .map(|v| serde_json::Value::from(v.rule()))
                .collect(),
        );
        Self {
            request_id,
            preset,
            reasons: report.reasons.clone(),
            metadata,
            report,
        }
    }
}

/// What the caller should do with a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The request itself is wrong; resubmitting it unchanged will fail again.
    FixInput,
    /// Nothing remains applied; the same request may succeed later.
    Retry,
    /// Compensation failed and state may be inconsistent. Needs an operator.
    DoNotRetry,
}

/// Errors returned by [`crate::WorkflowCoordinator::execute`].
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The policy refused the request.
    #[error("Request rejected by {} policy: {}", .0.preset.as_str(), .0.reasons.join("; "))]
    Rejected(Box<Rejection>),

    /// The request could not be turned into an order.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    /// A step failed and everything done so far was compensated.
    #[error("Workflow failed ({kind}): {message}")]
    Execution {
        kind: ExecutionErrorKind,
        message: String,
    },

    /// Compensation itself failed.
    #[error("Workflow run {run_id} failed and could not be rolled back: {cause}")]
    Fatal {
        run_id: RunId,
        #[source]
        cause: Box<WorkflowError>,
        compensation_failures: Vec<String>,
    },
}

impl WorkflowError {
    /// Creates an execution error of the given kind.
    pub fn execution(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        WorkflowError::Execution {
            kind,
            message: message.into(),
        }
    }

    /// Returns what the caller should do about this error.
    pub fn disposition(&self) -> Disposition {
        match self {
            WorkflowError::Rejected(_) | WorkflowError::InvalidRequest(_) => Disposition::FixInput,
            WorkflowError::Execution { .. } => Disposition::Retry,
            WorkflowError::Fatal { .. } => Disposition::DoNotRetry,
        }
    }

    /// The execution kind, looking through a fatal error to its cause.
    pub fn execution_kind(&self) -> Option<ExecutionErrorKind> {
        match self {
            WorkflowError::Execution { kind, .. } => Some(*kind),
            WorkflowError::Fatal { cause, .. } => cause.execution_kind(),
            _ => None,
        }
    }

    /// Returns true if the same request may be retried as is.
    pub fn is_retriable(&self) -> bool {
        self.disposition() == Disposition::Retry
    }

    /// Returns the rejection details if the policy said no.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            WorkflowError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
