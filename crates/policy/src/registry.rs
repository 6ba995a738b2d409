//! Rule registry mapping rule ids to implementations.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PolicyError, Result};
use crate::policy::Policy;
use crate::preset::Preset;
use crate::rule::Rule;
use crate::rules::{
    ActiveCustomer, CreditLimit, EstablishedAccount, GuestContact, GuestOrderCeiling,
    OrderValueCeiling, ShippingAddress, StockAvailable, VerifiedPayment,
};
use crate::settings::RuleSettings;

/// Resolves the rule ids named by presets into shared rule instances.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in rule, parameterised by `settings`.
    pub fn with_builtin_rules(settings: &RuleSettings) -> Self {
        let mut registry = Self::new();
        registry
            .register(ActiveCustomer)
            .register(CreditLimit)
            .register(StockAvailable)
            .register(ShippingAddress)
            .register(VerifiedPayment)
            .register(EstablishedAccount {
                min_days: settings.min_account_age_days,
            })
            .register(GuestContact)
            .register(GuestOrderCeiling {
                ceiling: settings.guest_order_ceiling,
            })
            .register(OrderValueCeiling {
                ceiling: settings.order_value_ceiling,
            });
        registry
    }

    /// Registers a rule under its own name, replacing any previous rule.
    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        self.register_shared(Arc::new(rule))
    }

    /// Registers an already shared rule under its own name.
    pub fn register_shared(&mut self, rule: Arc<dyn Rule>) -> &mut Self {
        self.rules.insert(rule.name().to_string(), rule);
        self
    }

    /// Looks up a rule by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.rules.get(id).cloned()
    }

    /// Returns true if a rule with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Returns the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Builds the policy described by `preset`.
    pub fn resolve(&self, preset: &Preset) -> Result<Policy> {
        preset
            .entries()
            .iter()
            .try_fold(Policy::new(preset.name().as_str()), |policy, entry| {
                let rule = self.get(&entry.rule).ok_or_else(|| PolicyError::UnknownRule {
                    preset: preset.name().to_string(),
                    rule: entry.rule.clone(),
                })?;
                if !(entry.weight.is_finite() && entry.weight > 0.0) {
                    return Err(PolicyError::InvalidWeight {
                        rule: entry.rule.clone(),
                        weight: entry.weight,
                    });
                }
                Ok(policy.add_shared_rule(rule, entry.weight, entry.critical))
            })
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.rules.keys().collect();
        ids.sort();
        f.debug_struct("RuleRegistry").field("rules", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{PresetEntry, PresetName};
    use crate::rule::AlwaysPass;
    use crate::rules::ids;

    #[test]
    fn builtin_registry_covers_every_builtin_preset() {
        let registry = RuleRegistry::with_builtin_rules(&RuleSettings::default());
        assert_eq!(registry.len(), 9);

        for name in PresetName::ALL {
            let preset = Preset::builtin(name);
            let policy = registry.resolve(&preset).unwrap();
            assert_eq!(policy.name(), name.as_str());
            assert_eq!(policy.len(), preset.entries().len());
        }
    }

    #[test]
    fn resolve_keeps_entry_order_weights_and_criticality() {
        let registry = RuleRegistry::with_builtin_rules(&RuleSettings::default());
        let policy = registry.resolve(&Preset::standard()).unwrap();

        let rules = policy.rules();
        assert_eq!(rules[0].name(), ids::ACTIVE_CUSTOMER);
        assert_eq!(rules[3].name(), ids::SHIPPING_ADDRESS);
        assert!(!rules[3].is_critical());
        assert_eq!(rules[4].weight(), 0.5);
    }

    #[test]
    fn unknown_rule_is_an_error() {
        let registry = RuleRegistry::new();
        let preset = Preset::new(
            PresetName::Standard,
            vec![PresetEntry::critical("nope", 1.0)],
        );
        assert!(matches!(
            registry.resolve(&preset),
            Err(PolicyError::UnknownRule { rule, .. }) if rule == "nope"
        ));
    }

    #[test]
    fn non_positive_weight_is_an_error_not_a_panic() {
        let mut registry = RuleRegistry::new();
        registry.register(AlwaysPass::named("x"));
        let preset = Preset::new(PresetName::Internal, vec![PresetEntry::advisory("x", -1.0)]);
        assert!(matches!(
            registry.resolve(&preset),
            Err(PolicyError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn register_replaces_by_name() {
        let mut registry = RuleRegistry::with_builtin_rules(&RuleSettings::default());
        registry.register(AlwaysPass::named(ids::CREDIT_LIMIT));
        assert_eq!(registry.len(), 9);
        assert!(registry.contains(ids::CREDIT_LIMIT));
    }
}
