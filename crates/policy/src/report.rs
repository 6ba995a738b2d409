//! Aggregated policy results.

use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// The aggregate outcome of running a [`crate::Policy`].
///
/// `reasons` concatenates the reasons of every failing verdict in
/// evaluation order. `confidence_score` is the weighted share of passing
/// rules, rounded to a whole percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub policy: String,
    pub passed: bool,
    pub reasons: Vec<String>,
    pub critical_failure: bool,
    pub confidence_score: u8,
    pub per_rule: Vec<Verdict>,
    pub execution_duration_millis: u64,
}

impl PolicyReport {
    /// Verdicts that did not pass, in evaluation order.
    pub fn failed_rules(&self) -> impl Iterator<Item = &Verdict> {
        self.per_rule.iter().filter(|v| !v.passed())
    }

    /// The verdict produced by the rule with the given name.
    pub fn verdict_for(&self, rule: &str) -> Option<&Verdict> {
        self.per_rule.iter().find(|v| v.rule() == rule)
    }
}

/// `round(100 * passed / total)`, or 0 when there is no weight at all.
pub(crate) fn confidence_score(passed_weight: f64, total_weight: f64) -> u8 {
    if total_weight <= 0.0 {
        return 0;
    }
    (100.0 * passed_weight / total_weight).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rounds_to_whole_percent() {
        assert_eq!(confidence_score(1.0, 2.0), 50);
        assert_eq!(confidence_score(2.0, 3.0), 67);
        assert_eq!(confidence_score(1.0, 3.0), 33);
        assert_eq!(confidence_score(3.0, 3.0), 100);
        assert_eq!(confidence_score(0.0, 3.0), 0);
    }

    #[test]
    fn confidence_is_zero_without_weight() {
        assert_eq!(confidence_score(0.0, 0.0), 0);
    }
}
