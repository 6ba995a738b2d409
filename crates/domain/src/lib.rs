//! Domain layer for the checkpoint workflow engine.
//!
//! This crate holds the plain data the rest of the workspace reasons about:
//! - Identifiers and money value objects
//! - The incoming `OrderRequest` with its line items
//! - The `Order` entity placed in memory once a request clears its policy

pub mod error;
pub mod ids;
pub mod money;
pub mod order;
pub mod request;

pub use error::DomainError;
pub use ids::{CustomerId, OrderId, ResourceId, RunId};
pub use money::Money;
pub use order::Order;
pub use request::{Channel, LineItem, OrderRequest};
