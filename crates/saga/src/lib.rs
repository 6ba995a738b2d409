//! Policy-gated order workflow.
//!
//! The [`WorkflowCoordinator`] resolves the facts a request needs, runs the
//! matching policy preset and, only when it passes, executes the ordered
//! steps:
//! 1. Place the order in memory
//! 2. Reserve every line item, in line order
//! 3. Commit the order and its sub-records in one atomic call
//! 4. Commit the reservations and publish a completion event
//!
//! If a step fails, or the caller cancels or the deadline passes, every
//! reservation made so far is released in reverse order of acquisition.

pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod run;
pub mod services;
pub mod state;

pub use cancel::{CancelHandle, CancelSignal, ExecutionOptions, cancellation};
pub use config::WorkflowConfig;
pub use coordinator::{OrderConfirmation, WorkflowCoordinator, select_preset};
pub use error::{Disposition, ExecutionErrorKind, Rejection, WorkflowError};
pub use events::WorkflowEvent;
pub use run::{Compensation, CompletedStep, StepKind, WorkflowRun};
pub use services::{
    EventPublisher, FactError, FactResolver, InMemoryEventPublisher, InMemoryFactResolver,
    InMemoryOrderRepository, InMemoryReservationCoordinator, OrderRecord, OrderRepository,
    PersistenceError, PublishError, Reservation, ReservationCoordinator, ReservationError,
    ReservationId, ReservationState,
};
pub use state::{RunOutcome, WorkflowState};
