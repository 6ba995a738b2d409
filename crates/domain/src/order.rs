//! The order entity placed once a request clears its policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{CustomerId, OrderId};
use crate::money::Money;
use crate::request::{Channel, LineItem, OrderRequest};

/// An order built in memory from a validated request.
///
/// Construction is pure; nothing is reserved or stored until the workflow
/// runs its later steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: Option<CustomerId>,
    guest_email: Option<String>,
    channel: Channel,
    lines: Vec<LineItem>,
    shipping_address: Option<String>,
    total: Money,
    placed_at: DateTime<Utc>,
}

impl Order {
    /// Places an order from a request.
    ///
    /// The order id is the request id, so retries of the same request map to
    /// the same order.
    pub fn place(request: &OrderRequest, placed_at: DateTime<Utc>) -> Result<Self, DomainError> {
        let total = request.validate()?;

        Ok(Self {
            id: request.request_id,
            customer_id: request.customer_id,
            guest_email: request.guest_email.clone(),
            channel: request.channel,
            lines: request.lines.clone(),
            shipping_address: request.shipping_address.clone(),
            total,
            placed_at,
        })
    }

    /// Returns the order id.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the customer, or `None` for a guest order.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the guest e-mail address, if any.
    pub fn guest_email(&self) -> Option<&str> {
        self.guest_email.as_deref()
    }

    /// Returns the originating channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns the line items in request order.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Returns the number of line items.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the shipping address, if any.
    pub fn shipping_address(&self) -> Option<&str> {
        self.shipping_address.as_deref()
    }

    /// Returns the exact order total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns when the order was placed.
    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}
