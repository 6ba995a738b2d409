//! Weighted rule aggregation.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use crate::context::Context;
use crate::error::EvaluationFault;
use crate::report::{PolicyReport, confidence_score};
use crate::rule::Rule;
use crate::verdict::Verdict;

/// A rule together with its weight and criticality inside one policy.
#[derive(Clone)]
pub struct WeightedRule {
    rule: Arc<dyn Rule>,
    weight: f64,
    critical: bool,
}

impl WeightedRule {
    /// Panics unless `weight` is a positive finite number.
    pub fn new(rule: Arc<dyn Rule>, weight: f64, critical: bool) -> Self {
        assert!(
            weight.is_finite() && weight > 0.0,
            "rule '{}' needs a positive weight, got {weight}",
            rule.name()
        );
        Self {
            rule,
            weight,
            critical,
        }
    }

    /// Returns the rule name.
    pub fn name(&self) -> &str {
        self.rule.name()
    }

    /// Returns the wrapped rule.
    pub fn rule(&self) -> &Arc<dyn Rule> {
        &self.rule
    }

    /// Returns the rule weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns true if a failure of this rule rejects the request.
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Runs the rule, turning a panic into a fault.
    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault> {
        match catch_unwind(AssertUnwindSafe(|| self.rule.evaluate(ctx))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(EvaluationFault::Panicked(message))
            }
        }
    }
}

impl std::fmt::Debug for WeightedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedRule")
            .field("rule", &self.name())
            .field("weight", &self.weight)
            .field("critical", &self.critical)
            .finish()
    }
}

/// An ordered collection of weighted rules (a "checkpoint").
///
/// Build it with [`Policy::add_rule`] / [`Policy::remove_rule`] during
/// setup, then share it read-only (typically behind an `Arc`). `run` only
/// needs `&self`.
#[derive(Debug, Clone)]
pub struct Policy {
    name: String,
    rules: Vec<WeightedRule>,
}

impl Policy {
    /// Creates an empty policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Appends a rule. Panics on a non-positive or non-finite weight.
    pub fn add_rule<R: Rule + 'static>(self, rule: R, weight: f64, critical: bool) -> Self {
        self.add_shared_rule(Arc::new(rule), weight, critical)
    }

    /// Appends a rule that is already shared, e.g. one taken from a registry.
    pub fn add_shared_rule(mut self, rule: Arc<dyn Rule>, weight: f64, critical: bool) -> Self {
        self.rules.push(WeightedRule::new(rule, weight, critical));
        self
    }

    /// Drops every rule matching `predicate`.
    pub fn remove_rule(mut self, predicate: impl Fn(&WeightedRule) -> bool) -> Self {
        self.rules.retain(|r| !predicate(r));
        self
    }

    /// Drops the rules with the given name.
    pub fn without(self, rule_name: &str) -> Self {
        self.remove_rule(|r| r.name() == rule_name)
    }

    /// Returns the policy name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the weighted rules in evaluation order.
    pub fn rules(&self) -> &[WeightedRule] {
        &self.rules
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the policy has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the sum of every rule weight.
    pub fn total_weight(&self) -> f64 {
        self.rules.iter().map(WeightedRule::weight).sum()
    }

    /// Evaluates every rule against `ctx` and aggregates the verdicts.
    ///
    /// All rules run in registration order regardless of earlier failures.
    /// A rule that faults (or panics) yields a failing verdict and counts as
    /// critical even if it was registered as non-critical.
    #[tracing::instrument(skip(self, ctx), fields(policy = %self.name, rules = self.rules.len()))]
    pub fn run(&self, ctx: &Context) -> PolicyReport {
        let started = Instant::now();

        let mut per_rule = Vec::with_capacity(self.rules.len());
        let mut reasons = Vec::new();
        let mut critical_failure = false;
        let mut total_weight = 0.0;
        let mut passed_weight = 0.0;

        for weighted in &self.rules {
            let (verdict, critical) = match weighted.evaluate(ctx) {
                Ok(verdict) => (verdict, weighted.critical),
                Err(fault) => {
                    tracing::warn!(rule = weighted.name(), %fault, "rule could not be evaluated");
                    metrics::counter!("policy_rule_faults_total").increment(1);
                    (Verdict::fault(weighted.name(), &fault), true)
                }
            };

            total_weight += weighted.weight;
            if verdict.passed() {
                passed_weight += weighted.weight;
            } else {
                critical_failure |= critical;
                reasons.extend(verdict.reasons().iter().cloned());
                tracing::debug!(rule = weighted.name(), critical, "rule failed");
            }
            per_rule.push(verdict);
        }

        let passed = per_rule.iter().all(Verdict::passed);
        let confidence = confidence_score(passed_weight, total_weight);
        let elapsed = started.elapsed();

        metrics::counter!("policy_evaluations_total", "policy" => self.name.clone()).increment(1);
        metrics::histogram!("policy_evaluation_duration_seconds").record(elapsed.as_secs_f64());
        tracing::debug!(passed, critical_failure, confidence, "policy evaluated");

        PolicyReport {
            policy: self.name.clone(),
            passed,
            reasons,
            critical_failure,
            confidence_score: confidence,
            per_rule,
            execution_duration_millis: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::AlwaysPass;
    use domain::{CustomerId, OrderRequest};

    struct AlwaysFail(&'static str);

    impl Rule for AlwaysFail {
        fn name(&self) -> &str {
            self.0
        }

        fn evaluate(&self, _ctx: &Context) -> Result<Verdict, EvaluationFault> {
            Ok(Verdict::fail(self.0, format!("{} failed", self.0)))
        }
    }

    struct Broken;

    impl Rule for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn evaluate(&self, _ctx: &Context) -> Result<Verdict, EvaluationFault> {
            Err(EvaluationFault::MissingFact("widget count".to_string()))
        }
    }

    struct Panics;

    impl Rule for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        fn evaluate(&self, _ctx: &Context) -> Result<Verdict, EvaluationFault> {
            panic!("boom")
        }
    }

    fn ctx() -> Context {
        Context::builder(OrderRequest::for_customer(CustomerId::new())).build()
    }

    #[test]
    fn active_pass_plus_critical_credit_fail_scores_fifty() {
        let policy = Policy::new("scenario")
            .add_rule(AlwaysPass::named("active_status"), 1.0, true)
            .add_rule(AlwaysFail("credit_limit"), 1.0, true);

        let report = policy.run(&ctx());

        assert!(!report.passed);
        assert!(report.critical_failure);
        assert_eq!(report.confidence_score, 50);
        assert_eq!(report.per_rule.len(), 2);
        assert_eq!(report.reasons, vec!["credit_limit failed".to_string()]);
    }

    #[test]
    fn every_rule_runs_even_after_failures() {
        let policy = Policy::new("all")
            .add_rule(AlwaysFail("first"), 1.0, true)
            .add_rule(AlwaysFail("second"), 1.0, false)
            .add_rule(AlwaysPass::named("third"), 1.0, false);

        let report = policy.run(&ctx());

        let names: Vec<&str> = report.per_rule.iter().map(Verdict::rule).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(
            report.reasons,
            vec!["first failed".to_string(), "second failed".to_string()]
        );
    }

    #[test]
    fn non_critical_failure_is_not_critical() {
        let policy = Policy::new("soft")
            .add_rule(AlwaysPass::named("ok"), 3.0, true)
            .add_rule(AlwaysFail("soft"), 1.0, false);

        let report = policy.run(&ctx());

        assert!(!report.passed);
        assert!(!report.critical_failure);
        assert_eq!(report.confidence_score, 75);
    }

    #[test]
    fn fault_in_non_critical_rule_becomes_critical_failure() {
        let policy = Policy::new("faulty")
            .add_rule(AlwaysPass::named("ok"), 1.0, false)
            .add_rule(Broken, 1.0, false);

        let report = policy.run(&ctx());

        assert!(!report.passed);
        assert!(report.critical_failure);
        assert_eq!(report.reasons.len(), 1);
        assert!(report.reasons[0].contains("missing fact: widget count"));
    }

    #[test]
    fn panicking_rule_is_absorbed() {
        let policy = Policy::new("panicky")
            .add_rule(Panics, 1.0, false)
            .add_rule(AlwaysPass::named("after"), 1.0, false);

        let report = policy.run(&ctx());

        assert!(!report.passed);
        assert!(report.critical_failure);
        assert!(report.reasons[0].contains("rule panicked: boom"));
        assert!(report.verdict_for("after").unwrap().passed());
    }

    #[test]
    fn empty_policy_passes_with_zero_confidence() {
        let report = Policy::new("empty").run(&ctx());
        assert!(report.passed);
        assert!(!report.critical_failure);
        assert_eq!(report.confidence_score, 0);
    }

    #[test]
    fn remove_rule_drops_matching_rules() {
        let policy = Policy::new("base")
            .add_rule(AlwaysPass::named("a"), 1.0, true)
            .add_rule(AlwaysFail("b"), 2.0, true)
            .add_rule(AlwaysPass::named("c"), 1.0, false)
            .without("b");

        assert_eq!(policy.len(), 2);
        assert_eq!(policy.total_weight(), 2.0);
        assert!(policy.run(&ctx()).passed);

        let only_critical = policy.remove_rule(|r| !r.is_critical());
        assert_eq!(only_critical.len(), 1);
        assert_eq!(only_critical.rules()[0].name(), "a");
    }

    #[test]
    #[should_panic(expected = "needs a positive weight")]
    fn zero_weight_is_a_programming_error() {
        let _ = Policy::new("bad").add_rule(AlwaysPass::default(), 0.0, false);
    }
}
