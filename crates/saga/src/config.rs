//! Workflow configuration loaded from environment variables.

use std::time::Duration;

use domain::Money;

/// Workflow tunables with sensible defaults.
///
/// Reads from environment variables:
/// - `HIGH_VALUE_THRESHOLD_CENTS`: totals above this use the high-value preset (default: `100000`)
/// - `WORKFLOW_DEADLINE_MS`: deadline applied when the caller sets none (default: unset)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub high_value_threshold: Money,
    pub default_deadline: Option<Duration>,
}

impl WorkflowConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            high_value_threshold: std::env::var("HIGH_VALUE_THRESHOLD_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Money::from_cents)
                .unwrap_or(defaults.high_value_threshold),
            default_deadline: std::env::var("WORKFLOW_DEADLINE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .or(defaults.default_deadline),
        }
    }

    /// Overrides the high-value threshold.
    pub fn with_high_value_threshold(mut self, threshold: Money) -> Self {
        self.high_value_threshold = threshold;
        self
    }

    /// Sets the deadline applied when a caller supplies none.
    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(deadline);
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: Money::from_dollars(1_000),
            default_deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = WorkflowConfig::default();
        assert_eq!(config.high_value_threshold.cents(), 100_000);
        assert!(config.default_deadline.is_none());
    }

    #[test]
    fn test_builders() {
        let config = WorkflowConfig::default()
            .with_high_value_threshold(Money::from_cents(5))
            .with_default_deadline(Duration::from_millis(250));
        assert_eq!(config.high_value_threshold.cents(), 5);
        assert_eq!(config.default_deadline, Some(Duration::from_millis(250)));
    }
}
