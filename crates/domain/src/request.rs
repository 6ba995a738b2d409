//! The order request submitted to the workflow.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{CustomerId, OrderId, ResourceId};
use crate::money::Money;

/// Where an order originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// A customer-facing checkout.
    #[default]
    Storefront,
    /// A back-office order entered by staff.
    Internal,
}

/// One requested line: a quantity of a single resource at a unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub resource_id: ResourceId,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(
        resource_id: impl Into<ResourceId>,
        description: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns `unit_price * quantity`, saturating on overflow.
    pub fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Returns `unit_price * quantity`, or `None` on overflow.
    pub fn checked_subtotal(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// A request to place an order.
///
/// A request without a customer id is a guest checkout. Line order is
/// significant: resources are reserved in the order the lines appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub request_id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub guest_email: Option<String>,
    #[serde(default)]
    pub channel: Channel,
    pub lines: Vec<LineItem>,
    pub shipping_address: Option<String>,
}

impl OrderRequest {
    /// Starts a request for a registered customer.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            request_id: OrderId::new(),
            customer_id: Some(customer_id),
            guest_email: None,
            channel: Channel::Storefront,
            lines: Vec::new(),
            shipping_address: None,
        }
    }

    /// Starts a guest request identified only by an e-mail address.
    pub fn for_guest(email: impl Into<String>) -> Self {
        Self {
            request_id: OrderId::new(),
            customer_id: None,
            guest_email: Some(email.into()),
            channel: Channel::Storefront,
            lines: Vec::new(),
            shipping_address: None,
        }
    }

    /// Appends a line item.
    pub fn with_line(mut self, line: LineItem) -> Self {
        self.lines.push(line);
        self
    }

    /// Sets the shipping address.
    pub fn ship_to(mut self, address: impl Into<String>) -> Self {
        self.shipping_address = Some(address.into());
        self
    }

    /// Sets the originating channel.
    pub fn via_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Sum of every line subtotal, saturating on overflow.
    ///
    /// Only meaningful for a request that passed [`OrderRequest::validate`].
    pub fn total(&self) -> Money {
        self.lines.iter().map(LineItem::subtotal).sum()
    }

    /// Checks the request is well-formed and returns its exact total.
    ///
    /// Rejects empty requests, zero quantities, negative prices, repeated
    /// resources and amounts that overflow.
    pub fn validate(&self) -> Result<Money, DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }

        let mut total = Money::zero();
        for (idx, line) in self.lines.iter().enumerate() {
            if line.quantity == 0 {
                return Err(DomainError::ZeroQuantity(line.resource_id.clone()));
            }
            if line.unit_price.is_negative() {
                return Err(DomainError::NegativePrice(line.resource_id.clone()));
            }
            if self.lines[..idx]
                .iter()
                .any(|earlier| earlier.resource_id == line.resource_id)
            {
                return Err(DomainError::DuplicateLine(line.resource_id.clone()));
            }
            total = line
                .checked_subtotal()
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| DomainError::AmountOverflow(line.resource_id.clone()))?;
        }
        Ok(total)
    }

    /// Returns true if the request has no customer id.
    pub fn is_guest(&self) -> bool {
        self.customer_id.is_none()
    }

    /// Distinct resources in line order.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.resource_id) {
                ids.push(line.resource_id.clone());
            }
        }
        ids
    }
}
