//! Single-rule verdicts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationFault;

/// The outcome of evaluating one rule.
///
/// Verdicts are produced fresh on every evaluation and are immutable once
/// built; the `with_*` methods consume and return the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    rule: String,
    passed: bool,
    reasons: Vec<String>,
    evaluated_at: DateTime<Utc>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl Verdict {
    /// A passing verdict with no reasons.
    pub fn pass(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            passed: true,
            reasons: Vec::new(),
            evaluated_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// A failing verdict carrying one reason.
    pub fn fail(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            passed: false,
            reasons: vec![reason.into()],
            evaluated_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// A failing verdict standing in for a rule that could not run.
    pub fn fault(rule: impl Into<String>, fault: &EvaluationFault) -> Self {
        let rule = rule.into();
        let reason = format!("{rule}: evaluation fault: {fault}");
        Self::fail(rule, reason).with_metadata("fault", fault.to_string())
    }

    /// Builds a pass or a fail depending on `passed`.
    pub fn check(rule: impl Into<String>, passed: bool, reason: impl Into<String>) -> Self {
        if passed {
            Self::pass(rule)
        } else {
            Self::fail(rule, reason)
        }
    }

    /// Adds a human-readable reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    /// Attaches a metadata value under `key`.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the name of the rule that produced this verdict.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Returns true if the rule passed.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the reasons given by the rule.
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Returns when the rule was evaluated.
    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    /// Returns the rule's metadata.
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_has_no_reasons() {
        let verdict = Verdict::pass("always");
        assert!(verdict.passed());
        assert!(verdict.reasons().is_empty());
        assert_eq!(verdict.rule(), "always");
    }

    #[test]
    fn fault_verdict_folds_fault_text_into_reasons() {
        let fault = EvaluationFault::MissingFact("customer".to_string());
        let verdict = Verdict::fault("credit_limit", &fault);

        assert!(!verdict.passed());
        assert_eq!(
            verdict.reasons(),
            &["credit_limit: evaluation fault: missing fact: customer".to_string()]
        );
        assert_eq!(
            verdict.metadata().get("fault"),
            Some(&serde_json::Value::from("missing fact: customer"))
        );
    }

    #[test]
    fn check_picks_pass_or_fail() {
        assert!(Verdict::check("r", true, "unused").passed());
        let failed = Verdict::check("r", false, "too big");
        assert!(!failed.passed());
        assert_eq!(failed.reasons(), &["too big".to_string()]);
    }
}
