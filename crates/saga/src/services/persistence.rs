//! Order persistence: one atomic commit per workflow run.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Order, OrderId, RunId};
use policy::PresetName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::reservation::ReservationId;

/// Everything stored for a committed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order: Order,
    pub reservations: Vec<ReservationId>,
    pub preset: PresetName,
    pub confidence_score: u8,
    pub run_id: RunId,
    pub committed_at: DateTime<Utc>,
}

/// Errors from the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    #[error("Order already exists: {0}")]
    Conflict(OrderId),
}

/// Stores orders. `commit` is all-or-nothing.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn commit(&self, record: OrderRecord) -> Result<(), PersistenceError>;

    async fn get(&self, order_id: OrderId) -> Result<Option<OrderRecord>, PersistenceError>;
}

#[derive(Debug, Default)]
struct RepositoryState {
    records: HashMap<OrderId, OrderRecord>,
    fail_on_commit: bool,
}

/// In-memory order store for tests and the sandbox.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<RepositoryState>>,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail every commit.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_commit = fail;
    }

    /// Returns the number of stored orders.
    pub fn record_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn commit(&self, record: OrderRecord) -> Result<(), PersistenceError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| PersistenceError::Unavailable("order store lock poisoned".into()))?;

        if state.fail_on_commit {
            return Err(PersistenceError::Unavailable("commit refused".into()));
        }

        let order_id = record.order.id();
        if state.records.contains_key(&order_id) {
            return Err(PersistenceError::Conflict(order_id));
        }
        state.records.insert(order_id, record);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<OrderRecord>, PersistenceError> {
        let state = self
            .state
            .read()
            .map_err(|_| PersistenceError::Unavailable("order store lock poisoned".into()))?;
        Ok(state.records.get(&order_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LineItem, Money, OrderRequest, ResourceId};

    fn record() -> OrderRecord {
        let request = OrderRequest::for_guest("guest@example.com").with_line(LineItem::new(
            ResourceId::new("sku-1"),
            "Widget",
            1,
            Money::from_dollars(5),
        ));
        OrderRecord {
            order: Order::place(&request, Utc::now()).unwrap(),
            reservations: vec![ReservationId::from_sequence(1)],
            preset: PresetName::Guest,
            confidence_score: 100,
            run_id: RunId::new(),
            committed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn commit_and_get() {
        let repo = InMemoryOrderRepository::new();
        let record = record();
        let order_id = record.order.id();

        repo.commit(record.clone()).await.unwrap();

        assert_eq!(repo.record_count(), 1);
        assert_eq!(repo.get(order_id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn duplicate_commit_conflicts() {
        let repo = InMemoryOrderRepository::new();
        let record = record();
        let order_id = record.order.id();

        repo.commit(record.clone()).await.unwrap();
        assert_eq!(
            repo.commit(record).await,
            Err(PersistenceError::Conflict(order_id))
        );
        assert_eq!(repo.record_count(), 1);
    }

    #[tokio::test]
    async fn fail_on_commit_stores_nothing() {
        let repo = InMemoryOrderRepository::new();
        repo.set_fail_on_commit(true);

        assert!(matches!(
            repo.commit(record()).await,
            Err(PersistenceError::Unavailable(_))
        ));
        assert_eq!(repo.record_count(), 0);
    }
}
