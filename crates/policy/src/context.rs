//! The immutable evaluation context handed to every rule.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use domain::{CustomerId, Money, OrderRequest, ResourceId};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationFault;

/// Account standing of a registered customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Suspended,
    Closed,
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Suspended => "suspended",
            CustomerStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// What the fact resolver knows about a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFacts {
    pub customer_id: CustomerId,
    pub status: CustomerStatus,
    pub credit_limit: Money,
    pub outstanding_balance: Money,
    pub payment_method_verified: bool,
    pub account_age_days: u32,
}

impl CustomerFacts {
    /// An active customer with the given credit limit and nothing owed.
    pub fn active(customer_id: CustomerId, credit_limit: Money) -> Self {
        Self {
            customer_id,
            status: CustomerStatus::Active,
            credit_limit,
            outstanding_balance: Money::zero(),
            payment_method_verified: true,
            account_age_days: 365,
        }
    }

    /// Credit still available, never negative.
    pub fn available_credit(&self) -> Money {
        self.credit_limit.saturating_sub(self.outstanding_balance)
    }
}

/// Units available per resource at the time the context was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventorySnapshot(BTreeMap<ResourceId, u32>);

impl InventorySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the available units of a resource.
    pub fn with(mut self, resource_id: impl Into<ResourceId>, available: u32) -> Self {
        self.0.insert(resource_id.into(), available);
        self
    }

    /// Returns the available units of a resource, if known.
    pub fn available(&self, resource_id: &ResourceId) -> Option<u32> {
        self.0.get(resource_id).copied()
    }

    /// Returns the number of resources in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ResourceId, u32)> for InventorySnapshot {
    fn from_iter<I: IntoIterator<Item = (ResourceId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What the fact resolver knows about the shipping destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingFacts {
    pub deliverable: bool,
    pub region: String,
}

/// Everything a policy needs to decide on one request.
///
/// Built once per workflow invocation through [`ContextBuilder`] and never
/// mutated afterwards; rules only ever see `&Context`.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    request: OrderRequest,
    customer: Option<CustomerFacts>,
    inventory: InventorySnapshot,
    shipping: Option<ShippingFacts>,
    built_at: DateTime<Utc>,
}

impl Context {
    /// Starts building a context for `request`.
    pub fn builder(request: OrderRequest) -> ContextBuilder {
        ContextBuilder::new(request)
    }

    /// Returns the request under evaluation.
    pub fn request(&self) -> &OrderRequest {
        &self.request
    }

    /// Returns the customer facts, if the request has a customer.
    pub fn customer(&self) -> Option<&CustomerFacts> {
        self.customer.as_ref()
    }

    /// Customer facts, or a fault for rules that cannot run without them.
    pub fn require_customer(&self) -> Result<&CustomerFacts, EvaluationFault> {
        self.customer
            .as_ref()
            .ok_or_else(|| EvaluationFault::MissingFact("customer".to_string()))
    }

    /// Returns the inventory snapshot.
    pub fn inventory(&self) -> &InventorySnapshot {
        &self.inventory
    }

    /// Returns the shipping facts, if an address was given.
    pub fn shipping(&self) -> Option<&ShippingFacts> {
        self.shipping.as_ref()
    }

    /// Returns the request total.
    pub fn order_total(&self) -> Money {
        self.request.total()
    }

    /// Returns when the context was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// One-shot builder for [`Context`].
#[derive(Debug)]
pub struct ContextBuilder {
    request: OrderRequest,
    customer: Option<CustomerFacts>,
    inventory: InventorySnapshot,
    shipping: Option<ShippingFacts>,
}

impl ContextBuilder {
    /// Creates a builder with an empty inventory snapshot.
    pub fn new(request: OrderRequest) -> Self {
        Self {
            request,
            customer: None,
            inventory: InventorySnapshot::default(),
            shipping: None,
        }
    }

    /// Sets the customer facts.
    pub fn customer(mut self, facts: CustomerFacts) -> Self {
        self.customer = Some(facts);
        self
    }

    /// Sets the inventory snapshot.
    pub fn inventory(mut self, snapshot: InventorySnapshot) -> Self {
        self.inventory = snapshot;
        self
    }

    /// Sets the shipping facts.
    pub fn shipping(mut self, facts: ShippingFacts) -> Self {
        self.shipping = Some(facts);
        self
    }

    /// Freezes the context.
    pub fn build(self) -> Context {
        Context {
            request: self.request,
            customer: self.customer,
            inventory: self.inventory,
            shipping: self.shipping,
            built_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::LineItem;

    #[test]
    fn available_credit_subtracts_balance() {
        let mut facts = CustomerFacts::active(CustomerId::new(), Money::from_cents(10_000));
        facts.outstanding_balance = Money::from_cents(2_500);
        assert_eq!(facts.available_credit().cents(), 7_500);

        facts.outstanding_balance = Money::from_cents(20_000);
        assert_eq!(facts.available_credit(), Money::zero());
    }

    #[test]
    fn require_customer_faults_for_guest_context() {
        let ctx = Context::builder(OrderRequest::for_guest("g@example.com")).build();
        assert_eq!(
            ctx.require_customer(),
            Err(EvaluationFault::MissingFact("customer".to_string()))
        );
    }

    #[test]
    fn builder_carries_all_facts() {
        let customer_id = CustomerId::new();
        let request = OrderRequest::for_customer(customer_id)
            .with_line(LineItem::new("sku-1", "Widget", 3, Money::from_cents(100)));
        let ctx = Context::builder(request)
            .customer(CustomerFacts::active(customer_id, Money::from_cents(1_000)))
            .inventory(InventorySnapshot::new().with("sku-1", 8))
            .shipping(ShippingFacts {
                deliverable: true,
                region: "EU".to_string(),
            })
            .build();

        assert_eq!(ctx.order_total().cents(), 300);
        assert_eq!(ctx.inventory().available(&ResourceId::from("sku-1")), Some(8));
        assert_eq!(ctx.customer().map(|c| c.customer_id), Some(customer_id));
        assert_eq!(ctx.shipping().map(|s| s.region.as_str()), Some("EU"));
    }
}
