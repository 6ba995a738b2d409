//! Domain error types.

use thiserror::Error;

use crate::ids::ResourceId;

/// Errors raised when a request cannot be turned into an order.
///
/// These describe malformed input, not business rejections: a request that
/// trips one of them never reaches the reservation step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The request carries no line items.
    #[error("Order has no line items")]
    EmptyOrder,

    /// A line item asks for zero units.
    #[error("Line item for {0} has zero quantity")]
    ZeroQuantity(ResourceId),

    /// A line item has a negative unit price.
    #[error("Line item for {0} has a negative unit price")]
    NegativePrice(ResourceId),

    /// The same resource appears on more than one line.
    #[error("Resource {0} is listed more than once")]
    DuplicateLine(ResourceId),

    /// A line subtotal or the order total does not fit in an amount.
    #[error("Order amount overflows at line for {0}")]
    AmountOverflow(ResourceId),
}
