//! Fact resolution: the external lookups a policy context needs.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{CustomerId, ResourceId};
use policy::{CustomerFacts, InventorySnapshot, ShippingFacts};
use thiserror::Error;

/// Errors from a fact lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactError {
    /// The source has no record for the identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The source could not be reached.
    #[error("Fact source unavailable: {0}")]
    Unavailable(String),
}

/// Resolves customer, inventory and shipping facts for a request.
#[async_trait]
pub trait FactResolver: Send + Sync {
    async fn customer(&self, customer_id: CustomerId) -> Result<CustomerFacts, FactError>;

    /// Availability for every resource in `resources`.
    async fn inventory(&self, resources: &[ResourceId]) -> Result<InventorySnapshot, FactError>;

    async fn shipping(&self, address: &str) -> Result<ShippingFacts, FactError>;
}

#[derive(Debug, Default)]
struct FactState {
    customers: HashMap<CustomerId, CustomerFacts>,
    stock: HashMap<ResourceId, u32>,
    undeliverable: HashSet<String>,
    unavailable: bool,
    latency: Option<Duration>,
}

/// In-memory fact source for tests and the sandbox.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFactResolver {
    state: Arc<RwLock<FactState>>,
}

impl InMemoryFactResolver {
    /// Creates an empty resolver with no latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the facts for a customer.
    pub fn add_customer(&self, facts: CustomerFacts) {
        self.write().customers.insert(facts.customer_id, facts);
    }

    /// Sets the availability reported for `resource_id`.
    pub fn stock(&self, resource_id: impl Into<ResourceId>, units: u32) {
        self.write().stock.insert(resource_id.into(), units);
    }

    /// Makes shipping lookups for `address` report it as undeliverable.
    pub fn mark_undeliverable(&self, address: impl Into<String>) {
        self.write().undeliverable.insert(address.into());
    }

    /// Configures every lookup to fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    /// Delays every lookup by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.write().latency = Some(latency);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, FactState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, FactState>, FactError> {
        self.state
            .read()
            .map_err(|_| FactError::Unavailable("fact store lock poisoned".into()))
    }

    /// Simulated round trip. No lock is held while sleeping.
    async fn round_trip(&self) -> Result<(), FactError> {
        let (latency, unavailable) = {
            let state = self.read()?;
            (state.latency, state.unavailable)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if unavailable {
            return Err(FactError::Unavailable("fact source offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl FactResolver for InMemoryFactResolver {
    async fn customer(&self, customer_id: CustomerId) -> Result<CustomerFacts, FactError> {
        self.round_trip().await?;
        self.read()?
            .customers
            .get(&customer_id)
            .cloned()
            .ok_or_else(|| FactError::NotFound(format!("customer {customer_id}")))
    }

    async fn inventory(&self, resources: &[ResourceId]) -> Result<InventorySnapshot, FactError> {
        self.round_trip().await?;
        let state = self.read()?;
        resources
            .iter()
            .map(|id| {
                state
                    .stock
                    .get(id)
                    .map(|units| (id.clone(), *units))
                    .ok_or_else(|| FactError::NotFound(format!("resource {id}")))
            })
            .collect()
    }

    async fn shipping(&self, address: &str) -> Result<ShippingFacts, FactError> {
        self.round_trip().await?;
        let state = self.read()?;
        let region = address
            .rsplit(',')
            .next()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or("unknown")
            .to_string();
        Ok(ShippingFacts {
            deliverable: !state.undeliverable.contains(address),
            region,
        })
    }
}
