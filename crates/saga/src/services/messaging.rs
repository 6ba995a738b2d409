//! Event publishing.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::events::WorkflowEvent;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Message broker unavailable: {0}")]
    Unavailable(String),
}

/// Publishes workflow events, at least once.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &WorkflowEvent) -> Result<(), PublishError>;
}

#[derive(Debug, Default)]
struct PublisherState {
    events: Vec<WorkflowEvent>,
    fail_on_publish: bool,
}

/// Records published events in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<PublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a publisher with no recorded events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to refuse every publish call.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_publish = fail;
    }

    /// Every event published so far, oldest first.
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }

    /// Returns the number of recorded events.
    pub fn event_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .len()
    }

    /// Returns the recorded events with the given `event_type`.
    pub fn events_of_type(&self, event_type: &str) -> Vec<WorkflowEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &WorkflowEvent) -> Result<(), PublishError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| PublishError::Unavailable("publisher lock poisoned".into()))?;
        if state.fail_on_publish {
            return Err(PublishError::Unavailable("publish refused".into()));
        }
        state.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Money, OrderId, RunId};

    #[tokio::test]
    async fn records_events_in_order() {
        let publisher = InMemoryEventPublisher::new();
        let run_id = RunId::new();
        let order_id = OrderId::new();

        publisher
            .publish(&WorkflowEvent::order_completed(
                run_id,
                order_id,
                None,
                Money::from_dollars(3),
                vec![],
            ))
            .await
            .unwrap();

        assert_eq!(publisher.event_count(), 1);
        assert_eq!(publisher.events_of_type("OrderCompleted").len(), 1);
        assert!(publisher.events_of_type("OrderRejected").is_empty());
    }

    #[tokio::test]
    async fn fail_on_publish_records_nothing() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail_on_publish(true);

        let event = WorkflowEvent::order_completed(
            RunId::new(),
            OrderId::new(),
            None,
            Money::zero(),
            vec![],
        );
        assert!(publisher.publish(&event).await.is_err());
        assert_eq!(publisher.event_count(), 0);
    }
}
