//! Behavioural properties of policy evaluation.

use domain::{CustomerId, LineItem, Money, OrderRequest};
use policy::{
    AlwaysPass, Context, CustomerFacts, CustomerStatus, EvaluationFault, InventorySnapshot,
    Policy, PolicySet, Preset, PresetName, Rule, RuleRegistry, RuleSettings, ShippingFacts, Verdict,
    rules::ids,
};

struct Fails(String);

impl Rule for Fails {
    fn name(&self) -> &str {
        &self.0
    }

    fn evaluate(&self, _ctx: &Context) -> Result<Verdict, EvaluationFault> {
        Ok(Verdict::fail(self.0.as_str(), format!("{} said no", self.0)))
    }
}

fn empty_ctx() -> Context {
    Context::builder(OrderRequest::for_customer(CustomerId::new())).build()
}

/// A well-formed customer order that clears every built-in rule.
fn healthy_ctx(unit_cents: i64) -> Context {
    let customer_id = CustomerId::new();
    let request = OrderRequest::for_customer(customer_id)
        .with_line(LineItem::new("sku-1", "Widget", 2, Money::from_cents(unit_cents)))
        .ship_to("1 Main St");
    Context::builder(request)
        .customer(CustomerFacts::active(
            customer_id,
            Money::from_dollars(1_000_000),
        ))
        .inventory(InventorySnapshot::new().with("sku-1", 10))
        .shipping(ShippingFacts {
            deliverable: true,
            region: "US".to_string(),
        })
        .build()
}

#[test]
fn passed_equals_all_verdicts_passed() {
    let layouts: Vec<Vec<bool>> = vec![
        vec![],
        vec![true],
        vec![false],
        vec![true, true, true],
        vec![true, false, true],
        vec![false, false],
    ];

    for layout in layouts {
        let policy = layout
            .iter()
            .enumerate()
            .fold(Policy::new("grid"), |p, (i, pass)| {
                if *pass {
                    p.add_rule(AlwaysPass::named(format!("r{i}")), 1.0, false)
                } else {
                    p.add_rule(Fails(format!("r{i}")), 1.0, false)
                }
            });
        let report = policy.run(&empty_ctx());
        assert_eq!(
            report.passed,
            report.per_rule.iter().all(Verdict::passed),
            "layout {layout:?}"
        );
        assert_eq!(report.per_rule.len(), layout.len());
    }
}

#[test]
fn confidence_never_drops_when_passing_rules_are_added() {
    let mut policy = Policy::new("growing").add_rule(Fails("f".to_string()), 2.0, false);
    let mut last = policy.run(&empty_ctx()).confidence_score;

    for i in 0..6 {
        policy = policy.add_rule(AlwaysPass::named(format!("p{i}")), 0.5 + i as f64, false);
        let score = policy.run(&empty_ctx()).confidence_score;
        assert!(score >= last, "{score} < {last} after adding p{i}");
        last = score;
    }
}

#[test]
fn confidence_never_rises_when_failing_rules_are_added() {
    let mut policy = Policy::new("shrinking").add_rule(AlwaysPass::named("p"), 3.0, false);
    let mut last = policy.run(&empty_ctx()).confidence_score;
    assert_eq!(last, 100);

    for i in 0..6 {
        policy = policy.add_rule(Fails(format!("f{i}")), 0.25 * (i + 1) as f64, false);
        let score = policy.run(&empty_ctx()).confidence_score;
        assert!(score <= last, "{score} > {last} after adding f{i}");
        last = score;
    }
}

#[test]
fn builtin_presets_pass_a_healthy_order() {
    let registry = RuleRegistry::with_builtin_rules(&RuleSettings::default());
    let set = PolicySet::builtin(&registry).unwrap();

    for name in [PresetName::Standard, PresetName::HighValue, PresetName::Internal] {
        let report = set.get(name).run(&healthy_ctx(1_000));
        assert!(report.passed, "{name}: {:?}", report.reasons);
        assert_eq!(report.confidence_score, 100);
        assert_eq!(report.policy, name.as_str());
    }
}

#[test]
fn standard_preset_rejects_suspended_customer_critically() {
    let registry = RuleRegistry::with_builtin_rules(&RuleSettings::default());
    let policy = registry.resolve(&Preset::standard()).unwrap();

    let customer_id = CustomerId::new();
    let request = OrderRequest::for_customer(customer_id)
        .with_line(LineItem::new("sku-1", "Widget", 1, Money::from_cents(100)))
        .ship_to("1 Main St");
    let mut facts = CustomerFacts::active(customer_id, Money::from_dollars(10));
    facts.status = CustomerStatus::Closed;
    let ctx = Context::builder(request)
        .customer(facts)
        .inventory(InventorySnapshot::new().with("sku-1", 1))
        .shipping(ShippingFacts {
            deliverable: true,
            region: "US".to_string(),
        })
        .build();

    let report = policy.run(&ctx);
    assert!(!report.passed);
    assert!(report.critical_failure);
    assert_eq!(report.reasons, vec!["Customer account is closed".to_string()]);
    // active_customer carries 1.0 of 4.5 total weight
    assert_eq!(report.confidence_score, 78);
}

#[test]
fn guest_preset_on_customer_free_context_runs_without_faults() {
    let registry = RuleRegistry::with_builtin_rules(&RuleSettings::default());
    let set = PolicySet::builtin(&registry).unwrap();

    let request = OrderRequest::for_guest("guest@example.com")
        .with_line(LineItem::new("sku-1", "Widget", 1, Money::from_cents(1_000)))
        .ship_to("2 High St");
    let ctx = Context::builder(request)
        .inventory(InventorySnapshot::new().with("sku-1", 3))
        .shipping(ShippingFacts {
            deliverable: true,
            region: "UK".to_string(),
        })
        .build();

    let report = set.get(PresetName::Guest).run(&ctx);
    assert!(report.passed, "{:?}", report.reasons);
    assert!(report.verdict_for(ids::GUEST_CONTACT).is_some());
}

#[test]
fn standard_preset_on_guest_context_faults_into_critical_failure() {
    let registry = RuleRegistry::with_builtin_rules(&RuleSettings::default());
    let set = PolicySet::builtin(&registry).unwrap();

    let request = OrderRequest::for_guest("guest@example.com")
        .with_line(LineItem::new("sku-1", "Widget", 1, Money::from_cents(1_000)));
    let ctx = Context::builder(request)
        .inventory(InventorySnapshot::new().with("sku-1", 3))
        .build();

    let report = set.get(PresetName::Standard).run(&ctx);
    assert!(!report.passed);
    assert!(report.critical_failure);
    assert!(
        report
            .reasons
            .iter()
            .any(|r| r.starts_with("active_customer: evaluation fault"))
    );
}
