//! Thresholds used by the built-in rules.

use domain::Money;

/// Tunables for the parameterised built-in rules.
///
/// Reads from environment variables:
/// - `MIN_ACCOUNT_AGE_DAYS`: minimum account age for high-value orders (default: `30`)
/// - `GUEST_ORDER_CEILING_CENTS`: largest guest order accepted (default: `50000`)
/// - `ORDER_VALUE_CEILING_CENTS`: largest order accepted at all (default: `10000000`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSettings {
    pub min_account_age_days: u32,
    pub guest_order_ceiling: Money,
    pub order_value_ceiling: Money,
}

impl RuleSettings {
    /// Loads settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_account_age_days: env_parse("MIN_ACCOUNT_AGE_DAYS")
                .unwrap_or(defaults.min_account_age_days),
            guest_order_ceiling: env_parse("GUEST_ORDER_CEILING_CENTS")
                .map(Money::from_cents)
                .unwrap_or(defaults.guest_order_ceiling),
            order_value_ceiling: env_parse("ORDER_VALUE_CEILING_CENTS")
                .map(Money::from_cents)
                .unwrap_or(defaults.order_value_ceiling),
        }
    }
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            min_account_age_days: 30,
            guest_order_ceiling: Money::from_dollars(500),
            order_value_ceiling: Money::from_dollars(100_000),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = RuleSettings::default();
        assert_eq!(settings.min_account_age_days, 30);
        assert_eq!(settings.guest_order_ceiling.cents(), 50_000);
        assert_eq!(settings.order_value_ceiling.cents(), 10_000_000);
    }
}
