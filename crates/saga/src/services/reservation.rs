//! Reservation coordinator trait and in-memory resource pool.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{OrderId, ResourceId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a reservation, e.g. `RSV-000042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(String);

impl ReservationId {
    /// Wraps an existing reservation id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Formats the pool's running sequence number as an id.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("RSV-{sequence:06}"))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a reservation. Only `Held` can move, and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationState {
    Held,
    Released,
    Committed,
}

impl ReservationState {
    /// Returns true if the state can move to `next`.
    pub fn can_transition_to(&self, next: ReservationState) -> bool {
        matches!(
            (self, next),
            (ReservationState::Held, ReservationState::Released)
                | (ReservationState::Held, ReservationState::Committed)
        )
    }
}

/// A hold on `quantity` units of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub resource_id: ResourceId,
    pub quantity: u32,
    pub holder: OrderId,
    pub state: ReservationState,
    pub created_at: DateTime<Utc>,
}

/// Errors from the reservation coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("Insufficient {resource_id}: requested {requested}, available {available}")]
    Insufficient {
        resource_id: ResourceId,
        requested: u32,
        available: u32,
    },

    #[error("Unknown resource: {0}")]
    UnknownResource(ResourceId),

    #[error("Invalid quantity {quantity} for {resource_id}")]
    InvalidQuantity {
        resource_id: ResourceId,
        quantity: u32,
    },

    #[error("Unknown reservation: {0}")]
    UnknownReservation(ReservationId),

    #[error("Reservation {0} was already released")]
    AlreadyReleased(ReservationId),

    #[error("Reservation service unavailable: {0}")]
    Unavailable(String),
}

/// Holds, releases and commits units of shared resources.
#[async_trait]
pub trait ReservationCoordinator: Send + Sync {
    /// Atomically checks availability and takes `quantity` units.
    /// On `Insufficient` the pool is left untouched.
    async fn reserve(
        &self,
        resource_id: &ResourceId,
        quantity: u32,
        holder: OrderId,
    ) -> Result<Reservation, ReservationError>;

    /// Returns held units to the pool. A no-op on a released or committed
    /// reservation.
    async fn release(&self, id: &ReservationId) -> Result<(), ReservationError>;

    /// Makes a reservation permanent. Committing twice is a no-op.
    async fn commit(&self, id: &ReservationId) -> Result<(), ReservationError>;

    /// Units currently free to reserve.
    async fn available(&self, resource_id: &ResourceId) -> Result<u32, ReservationError>;
}

#[derive(Debug, Default)]
struct PoolState {
    available: HashMap<ResourceId, u32>,
    reservations: HashMap<ReservationId, Reservation>,
    next_sequence: u64,
    fail_on_release: bool,
    fail_on_commit: bool,
}

/// In-memory resource pool. Clones share the same pool.
///
/// Every reservation is kept for the pool's lifetime, including released
/// and committed ones, so a late `release` or `commit` still finds its
/// entry and stays a no-op. Memory therefore grows with the number of
/// reservations ever made; this is a test and sandbox double, not a
/// long-running store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationCoordinator {
    state: Arc<Mutex<PoolState>>,
}

impl InMemoryReservationCoordinator {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `units` of `resource_id` to the pool.
    pub fn stock(&self, resource_id: impl Into<ResourceId>, units: u32) {
        let mut state = self.recover();
        let entry = state.available.entry(resource_id.into()).or_insert(0);
        *entry = entry.saturating_add(units);
    }

    /// Returns the free units of a resource, or `None` if it was never stocked.
    pub fn available_units(&self, resource_id: &ResourceId) -> Option<u32> {
        self.recover().available.get(resource_id).copied()
    }

    /// Returns a snapshot of a reservation in any state.
    pub fn reservation(&self, id: &ReservationId) -> Option<Reservation> {
        self.recover().reservations.get(id).cloned()
    }

    /// Number of reservations ever made, whatever their state.
    pub fn reservation_count(&self) -> usize {
        self.recover().reservations.len()
    }

    /// Number of reservations still in `Held`.
    pub fn held_count(&self) -> usize {
        self.recover()
            .reservations
            .values()
            .filter(|r| r.state == ReservationState::Held)
            .count()
    }

    /// Configures the pool to refuse release calls.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.recover().fail_on_release = fail;
    }

    /// Configures the pool to refuse commit calls.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.recover().fail_on_commit = fail;
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>, ReservationError> {
        self.state
            .lock()
            .map_err(|_| ReservationError::Unavailable("reservation pool lock poisoned".into()))
    }

    fn recover(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReservationCoordinator for InMemoryReservationCoordinator {
    async fn reserve(
        &self,
        resource_id: &ResourceId,
        quantity: u32,
        holder: OrderId,
    ) -> Result<Reservation, ReservationError> {
        if quantity == 0 {
            return Err(ReservationError::InvalidQuantity {
                resource_id: resource_id.clone(),
                quantity,
            });
        }

        let mut state = self.lock()?;
        let pool = &mut *state;

        let available = pool
            .available
            .get_mut(resource_id)
            .ok_or_else(|| ReservationError::UnknownResource(resource_id.clone()))?;
        if *available < quantity {
            return Err(ReservationError::Insufficient {
                resource_id: resource_id.clone(),
                requested: quantity,
                available: *available,
            });
        }
        *available -= quantity;

        pool.next_sequence += 1;
        let reservation = Reservation {
            id: ReservationId::from_sequence(pool.next_sequence),
            resource_id: resource_id.clone(),
            quantity,
            holder,
            state: ReservationState::Held,
            created_at: Utc::now(),
        };
        pool.reservations
            .insert(reservation.id.clone(), reservation.clone());

        Ok(reservation)
    }

    async fn release(&self, id: &ReservationId) -> Result<(), ReservationError> {
        let mut state = self.lock()?;
        let pool = &mut *state;

        if pool.fail_on_release {
            return Err(ReservationError::Unavailable(format!(
                "release of {id} refused"
            )));
        }

        let reservation = pool
            .reservations
            .get_mut(id)
            .ok_or_else(|| ReservationError::UnknownReservation(id.clone()))?;
        if !reservation.state.can_transition_to(ReservationState::Released) {
            return Ok(());
        }

        reservation.state = ReservationState::Released;
        let units = pool
            .available
            .entry(reservation.resource_id.clone())
            .or_insert(0);
        *units = units.saturating_add(reservation.quantity);
        Ok(())
    }

    async fn commit(&self, id: &ReservationId) -> Result<(), ReservationError> {
        let mut state = self.lock()?;

        if state.fail_on_commit {
            return Err(ReservationError::Unavailable(format!(
                "commit of {id} refused"
            )));
        }

        let reservation = state
            .reservations
            .get_mut(id)
            .ok_or_else(|| ReservationError::UnknownReservation(id.clone()))?;
        match reservation.state {
            ReservationState::Held => {
                reservation.state = ReservationState::Committed;
                Ok(())
            }
            ReservationState::Committed => Ok(()),
            ReservationState::Released => Err(ReservationError::AlreadyReleased(id.clone())),
        }
    }

    async fn available(&self, resource_id: &ResourceId) -> Result<u32, ReservationError> {
        self.lock()?
            .available
            .get(resource_id)
            .copied()
            .ok_or_else(|| ReservationError::UnknownResource(resource_id.clone()))
    }
}
