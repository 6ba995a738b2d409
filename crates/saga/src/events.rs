//! Events the workflow publishes through the messaging collaborator.

use chrono::{DateTime, Utc};
use domain::{CustomerId, Money, OrderId, RunId};
use policy::PresetName;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionErrorKind;
use crate::services::ReservationId;

/// Outcome events, one per finished run that got past fact resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowEvent {
    /// The policy refused the request. Nothing was reserved or stored.
    OrderRejected(OrderRejectedData),

    /// The order is stored and its reservations committed.
    OrderCompleted(OrderCompletedData),

    /// A step failed and every reservation was released.
    OrderRolledBack(OrderRolledBackData),
}

impl WorkflowEvent {
    /// Returns the event type name, as used in the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::OrderRejected(_) => "OrderRejected",
            WorkflowEvent::OrderCompleted(_) => "OrderCompleted",
            WorkflowEvent::OrderRolledBack(_) => "OrderRolledBack",
        }
    }

    /// The request or order this event concerns.
    pub fn order_id(&self) -> OrderId {
        match self {
            WorkflowEvent::OrderRejected(data) => data.order_id,
            WorkflowEvent::OrderCompleted(data) => data.order_id,
            WorkflowEvent::OrderRolledBack(data) => data.order_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejectedData {
    pub run_id: RunId,
    pub order_id: OrderId,
    pub preset: PresetName,
    pub reasons: Vec<String>,
    pub confidence_score: u8,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCompletedData {
    pub run_id: RunId,
    pub order_id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub total: Money,
    pub reservations: Vec<ReservationId>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRolledBackData {
    pub run_id: RunId,
    pub order_id: OrderId,
    pub kind: ExecutionErrorKind,
    pub reason: String,
    pub released: Vec<ReservationId>,
    pub rolled_back_at: DateTime<Utc>,
}

impl WorkflowEvent {
    /// Creates an `OrderRejected` event stamped now.
    pub fn order_rejected(
        run_id: RunId,
        order_id: OrderId,
        preset: PresetName,
        reasons: Vec<String>,
        confidence_score: u8,
    ) -> Self {
        WorkflowEvent::OrderRejected(OrderRejectedData {
            run_id,
            order_id,
            preset,
            reasons,
            confidence_score,
            rejected_at: Utc::now(),
        })
    }

    /// Creates an `OrderCompleted` event stamped now.
    pub fn order_completed(
        run_id: RunId,
        order_id: OrderId,
        customer_id: Option<CustomerId>,
        total: Money,
        reservations: Vec<ReservationId>,
    ) -> Self {
        WorkflowEvent::OrderCompleted(OrderCompletedData {
            run_id,
            order_id,
            customer_id,
            total,
            reservations,
            completed_at: Utc::now(),
        })
    }

    /// Creates an `OrderRolledBack` event stamped now.
    pub fn order_rolled_back(
        run_id: RunId,
        order_id: OrderId,
        kind: ExecutionErrorKind,
        reason: impl Into<String>,
        released: Vec<ReservationId>,
    ) -> Self {
        WorkflowEvent::OrderRolledBack(OrderRolledBackData {
            run_id,
            order_id,
            kind,
            reason: reason.into(),
            released,
            rolled_back_at: Utc::now(),
        })
    }
}
