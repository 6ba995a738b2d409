//! Collaborator traits and in-memory implementations for workflow steps.

pub mod facts;
pub mod messaging;
pub mod persistence;
pub mod reservation;

pub use facts::{FactError, FactResolver, InMemoryFactResolver};
pub use messaging::{EventPublisher, InMemoryEventPublisher, PublishError};
pub use persistence::{InMemoryOrderRepository, OrderRecord, OrderRepository, PersistenceError};
pub use reservation::{
    InMemoryReservationCoordinator, Reservation, ReservationCoordinator, ReservationError,
    ReservationId, ReservationState,
};
