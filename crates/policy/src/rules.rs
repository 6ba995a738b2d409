//! Built-in business rules.
//!
//! Each rule's [`Rule::name`] is one of the `ids` constants; presets refer to
//! rules by these ids.

use domain::Money;

use crate::context::{Context, CustomerStatus};
use crate::error::EvaluationFault;
use crate::rule::Rule;
use crate::verdict::Verdict;

/// Registry keys of the built-in rules.
pub mod ids {
    pub const ACTIVE_CUSTOMER: &str = "active_customer";
    pub const CREDIT_LIMIT: &str = "credit_limit";
    pub const STOCK_AVAILABLE: &str = "stock_available";
    pub const SHIPPING_ADDRESS: &str = "shipping_address";
    pub const VERIFIED_PAYMENT: &str = "verified_payment";
    pub const ESTABLISHED_ACCOUNT: &str = "established_account";
    pub const GUEST_CONTACT: &str = "guest_contact";
    pub const GUEST_ORDER_CEILING: &str = "guest_order_ceiling";
    pub const ORDER_VALUE_CEILING: &str = "order_value_ceiling";
}

/// The customer account must be active.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveCustomer;

impl Rule for ActiveCustomer {
    fn name(&self) -> &str {
        ids::ACTIVE_CUSTOMER
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let customer = ctx.require_customer()?;
        Ok(Verdict::check(
            ids::ACTIVE_CUSTOMER,
            customer.status == CustomerStatus::Active,
            format!("Customer account is {}", customer.status),
        )
        .with_metadata("status", customer.status.to_string()))
    }
}

/// The order total must fit within the customer's available credit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditLimit;

impl Rule for CreditLimit {
    fn name(&self) -> &str {
        ids::CREDIT_LIMIT
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let customer = ctx.require_customer()?;
        let total = ctx.order_total();
        let available = customer.available_credit();
        Ok(Verdict::check(
            ids::CREDIT_LIMIT,
            total <= available,
            format!("Order total {total} exceeds available credit {available}"),
        )
        .with_metadata("available_credit_cents", available.cents()))
    }
}

/// Every line must be covered by the inventory snapshot.
///
/// A line whose resource is missing from the snapshot is a fault, not a
/// shortage: the resolver failed to supply the fact.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockAvailable;

impl Rule for StockAvailable {
    fn name(&self) -> &str {
        ids::STOCK_AVAILABLE
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let mut short = Vec::new();
        for line in &ctx.request().lines {
            let available = ctx
                .inventory()
                .available(&line.resource_id)
                .ok_or_else(|| EvaluationFault::MissingFact(format!("stock of {}", line.resource_id)))?;
            if line.quantity > available {
                short.push(format!(
                    "Insufficient stock for {}: requested {}, available {}",
                    line.resource_id, line.quantity, available
                ));
            }
        }

        let mut iter = short.into_iter();
        Ok(match iter.next() {
            None => Verdict::pass(ids::STOCK_AVAILABLE),
            Some(first) => iter.fold(Verdict::fail(ids::STOCK_AVAILABLE, first), |v, reason| {
                v.with_reason(reason)
            }),
        })
    }
}

/// A shipping address must be present and deliverable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShippingAddress;

impl Rule for ShippingAddress {
    fn name(&self) -> &str {
        ids::SHIPPING_ADDRESS
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let Some(address) = ctx.request().shipping_address.as_deref() else {
            return Ok(Verdict::fail(ids::SHIPPING_ADDRESS, "No shipping address given"));
        };
        if address.trim().is_empty() {
            return Ok(Verdict::fail(ids::SHIPPING_ADDRESS, "Shipping address is blank"));
        }
        let shipping = ctx
            .shipping()
            .ok_or_else(|| EvaluationFault::MissingFact("shipping".to_string()))?;
        Ok(Verdict::check(
            ids::SHIPPING_ADDRESS,
            shipping.deliverable,
            format!("Address is not deliverable in region {}", shipping.region),
        )
        .with_metadata("region", shipping.region.clone()))
    }
}

/// The customer must have a verified payment method on file.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifiedPayment;

impl Rule for VerifiedPayment {
    fn name(&self) -> &str {
        ids::VERIFIED_PAYMENT
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let customer = ctx.require_customer()?;
        Ok(Verdict::check(
            ids::VERIFIED_PAYMENT,
            customer.payment_method_verified,
            "Payment method is not verified",
        ))
    }
}

/// The customer account must be at least `min_days` old.
#[derive(Debug, Clone, Copy)]
pub struct EstablishedAccount {
    pub min_days: u32,
}

impl Rule for EstablishedAccount {
    fn name(&self) -> &str {
        ids::ESTABLISHED_ACCOUNT
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let customer = ctx.require_customer()?;
        Ok(Verdict::check(
            ids::ESTABLISHED_ACCOUNT,
            customer.account_age_days >= self.min_days,
            format!(
                "Account is {} days old, {} required",
                customer.account_age_days, self.min_days
            ),
        ))
    }
}

/// A guest order must carry a usable contact e-mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestContact;

impl Rule for GuestContact {
    fn name(&self) -> &str {
        ids::GUEST_CONTACT
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let email = ctx.request().guest_email.as_deref().unwrap_or("").trim();
        let plausible = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        Ok(Verdict::check(
            ids::GUEST_CONTACT,
            plausible,
            "Guest order needs a valid contact e-mail",
        ))
    }
}

/// Guest orders are capped at a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct GuestOrderCeiling {
    pub ceiling: Money,
}

impl Rule for GuestOrderCeiling {
    fn name(&self) -> &str {
        ids::GUEST_ORDER_CEILING
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let total = ctx.order_total();
        Ok(Verdict::check(
            ids::GUEST_ORDER_CEILING,
            total <= self.ceiling,
            format!("Guest order total {total} exceeds {}", self.ceiling),
        ))
    }
}

/// No order may exceed an absolute ceiling.
#[derive(Debug, Clone, Copy)]
pub struct OrderValueCeiling {
    pub ceiling: Money,
}

impl Rule for OrderValueCeiling {
    fn name(&self) -> &str {
        ids::ORDER_VALUE_CEILING
    }

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        let total = ctx.order_total();
        Ok(Verdict::check(
            ids::ORDER_VALUE_CEILING,
            total <= self.ceiling,
            format!("Order total {total} exceeds the maximum of {}", self.ceiling),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CustomerFacts, InventorySnapshot, ShippingFacts};
    use domain::{CustomerId, LineItem, OrderRequest};

    fn customer_request(total_cents: i64) -> (OrderRequest, CustomerFacts) {
        let customer_id = CustomerId::new();
        let request = OrderRequest::for_customer(customer_id)
            .with_line(LineItem::new("sku-1", "Widget", 1, Money::from_cents(total_cents)))
            .ship_to("1 Main St");
        (
            request,
            CustomerFacts::active(customer_id, Money::from_cents(10_000)),
        )
    }

    #[test]
    fn active_customer_fails_for_suspended_account() {
        let (request, mut facts) = customer_request(100);
        facts.status = CustomerStatus::Suspended;
        let ctx = Context::builder(request).customer(facts).build();

        let verdict = ActiveCustomer.evaluate(&ctx).unwrap();
        assert!(!verdict.passed());
        assert_eq!(verdict.reasons(), &["Customer account is suspended".to_string()]);
    }

    #[test]
    fn customer_rules_fault_without_customer_facts() {
        let (request, _) = customer_request(100);
        let ctx = Context::builder(request).build();

        assert!(ActiveCustomer.evaluate(&ctx).is_err());
        assert!(CreditLimit.evaluate(&ctx).is_err());
        assert!(VerifiedPayment.evaluate(&ctx).is_err());
        assert!(EstablishedAccount { min_days: 1 }.evaluate(&ctx).is_err());
    }

    #[test]
    fn credit_limit_compares_total_with_available_credit() {
        let (request, facts) = customer_request(10_000);
        let ctx = Context::builder(request).customer(facts.clone()).build();
        assert!(CreditLimit.evaluate(&ctx).unwrap().passed());

        let (request, _) = customer_request(10_001);
        let ctx = Context::builder(request).customer(facts).build();
        assert!(!CreditLimit.evaluate(&ctx).unwrap().passed());
    }

    #[test]
    fn stock_available_lists_every_short_line() {
        let request = OrderRequest::for_customer(CustomerId::new())
            .with_line(LineItem::new("a", "A", 5, Money::from_cents(1)))
            .with_line(LineItem::new("b", "B", 1, Money::from_cents(1)))
            .with_line(LineItem::new("c", "C", 9, Money::from_cents(1)));
        let ctx = Context::builder(request)
            .inventory(InventorySnapshot::new().with("a", 4).with("b", 1).with("c", 0))
            .build();

        let verdict = StockAvailable.evaluate(&ctx).unwrap();
        assert!(!verdict.passed());
        assert_eq!(verdict.reasons().len(), 2);
        assert!(verdict.reasons()[0].contains("for a"));
        assert!(verdict.reasons()[1].contains("for c"));
    }

    #[test]
    fn stock_available_faults_on_unknown_resource() {
        let (request, _) = customer_request(100);
        let ctx = Context::builder(request).build();
        assert!(matches!(
            StockAvailable.evaluate(&ctx),
            Err(EvaluationFault::MissingFact(_))
        ));
    }

    #[test]
    fn shipping_address_checks_presence_and_deliverability() {
        let request = OrderRequest::for_customer(CustomerId::new());
        let ctx = Context::builder(request).build();
        assert!(!ShippingAddress.evaluate(&ctx).unwrap().passed());

        let (request, _) = customer_request(100);
        let ctx = Context::builder(request.clone())
            .shipping(ShippingFacts {
                deliverable: false,
                region: "Antarctica".to_string(),
            })
            .build();
        assert!(!ShippingAddress.evaluate(&ctx).unwrap().passed());

        let ctx = Context::builder(request).build();
        assert!(ShippingAddress.evaluate(&ctx).is_err());
    }

    #[test]
    fn guest_contact_requires_plausible_email() {
        let ok = Context::builder(OrderRequest::for_guest("ann@example.com")).build();
        assert!(GuestContact.evaluate(&ok).unwrap().passed());

        let bad = Context::builder(OrderRequest::for_guest("not-an-email")).build();
        assert!(!GuestContact.evaluate(&bad).unwrap().passed());

        let local_missing = Context::builder(OrderRequest::for_guest("@example.com")).build();
        assert!(!GuestContact.evaluate(&local_missing).unwrap().passed());
    }

    #[test]
    fn ceilings_are_inclusive() {
        let (request, _) = customer_request(500);
        let ctx = Context::builder(request).build();

        let at = Money::from_cents(500);
        let below = Money::from_cents(499);
        assert!(GuestOrderCeiling { ceiling: at }.evaluate(&ctx).unwrap().passed());
        assert!(!GuestOrderCeiling { ceiling: below }.evaluate(&ctx).unwrap().passed());
        assert!(OrderValueCeiling { ceiling: at }.evaluate(&ctx).unwrap().passed());
        assert!(!OrderValueCeiling { ceiling: below }.evaluate(&ctx).unwrap().passed());
    }
}
