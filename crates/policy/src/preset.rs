//! Named policy presets as plain data.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};
use crate::policy::Policy;
use crate::registry::RuleRegistry;
use crate::rules::ids;

/// The presets the workflow chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetName {
    Standard,
    HighValue,
    Guest,
    Internal,
}

impl PresetName {
    pub const ALL: [PresetName; 4] = [
        PresetName::Standard,
        PresetName::HighValue,
        PresetName::Guest,
        PresetName::Internal,
    ];

    /// Returns the preset name as written in catalogs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Standard => "standard",
            PresetName::HighValue => "high-value",
            PresetName::Guest => "guest",
            PresetName::Internal => "internal",
        }
    }
}

impl std::fmt::Display for PresetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{rule, weight, critical}` tuple of a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetEntry {
    pub rule: String,
    pub weight: f64,
    #[serde(default)]
    pub critical: bool,
}

impl PresetEntry {
    /// Creates an entry whose failure rejects the request outright.
    pub fn critical(rule: impl Into<String>, weight: f64) -> Self {
        Self {
            rule: rule.into(),
            weight,
            critical: true,
        }
    }

    /// Creates an entry that only lowers the confidence score.
    pub fn advisory(rule: impl Into<String>, weight: f64) -> Self {
        Self {
            rule: rule.into(),
            weight,
            critical: false,
        }
    }
}

/// A named, ordered list of rule references.
///
/// Presets never hold rule implementations; [`RuleRegistry::resolve`] turns
/// one into a runnable [`Policy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    name: PresetName,
    entries: Vec<PresetEntry>,
}

impl Preset {
    /// Creates a preset from its entries, in evaluation order.
    pub fn new(name: PresetName, entries: Vec<PresetEntry>) -> Self {
        Self { name, entries }
    }

    /// Identity, credit, stock, delivery and an absolute value ceiling.
    pub fn standard() -> Self {
        Self::new(
            PresetName::Standard,
            vec![
                PresetEntry::critical(ids::ACTIVE_CUSTOMER, 1.0),
                PresetEntry::critical(ids::CREDIT_LIMIT, 1.0),
                PresetEntry::critical(ids::STOCK_AVAILABLE, 1.0),
                PresetEntry::advisory(ids::SHIPPING_ADDRESS, 1.0),
                PresetEntry::critical(ids::ORDER_VALUE_CEILING, 0.5),
            ],
        )
    }

    /// Standard plus payment verification and account age.
    pub fn high_value() -> Self {
        Self::standard()
            .renamed(PresetName::HighValue)
            .with(PresetEntry::critical(ids::VERIFIED_PAYMENT, 2.0))
            .with(PresetEntry::critical(ids::ESTABLISHED_ACCOUNT, 1.0))
    }

    /// Standard with the identity rules swapped for guest checks.
    pub fn guest() -> Self {
        Self::standard()
            .renamed(PresetName::Guest)
            .without(ids::ACTIVE_CUSTOMER)
            .without(ids::CREDIT_LIMIT)
            .with(PresetEntry::critical(ids::GUEST_CONTACT, 1.0))
            .with(PresetEntry::critical(ids::GUEST_ORDER_CEILING, 1.0))
    }

    /// Standard without credit and delivery checks for back-office orders.
    pub fn internal() -> Self {
        Self::standard()
            .renamed(PresetName::Internal)
            .without(ids::CREDIT_LIMIT)
            .without(ids::SHIPPING_ADDRESS)
    }

    /// Returns the built-in definition of a preset.
    pub fn builtin(name: PresetName) -> Self {
        match name {
            PresetName::Standard => Self::standard(),
            PresetName::HighValue => Self::high_value(),
            PresetName::Guest => Self::guest(),
            PresetName::Internal => Self::internal(),
        }
    }

    /// Returns the preset under another name.
    pub fn renamed(mut self, name: PresetName) -> Self {
        self.name = name;
        self
    }

    /// Appends an entry.
    pub fn with(mut self, entry: PresetEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Drops every entry for `rule`.
    pub fn without(mut self, rule: &str) -> Self {
        self.entries.retain(|e| e.rule != rule);
        self
    }

    /// Returns the preset name.
    pub fn name(&self) -> PresetName {
        self.name
    }

    /// Returns the entries in evaluation order.
    pub fn entries(&self) -> &[PresetEntry] {
        &self.entries
    }

    /// Returns the rule ids in evaluation order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.rule.as_str())
    }
}

/// The set of preset definitions in force.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetCatalog {
    presets: BTreeMap<PresetName, Preset>,
}

impl PresetCatalog {
    /// The built-in definitions of every preset.
    pub fn builtin() -> Self {
        Self {
            presets: PresetName::ALL
                .into_iter()
                .map(|name| (name, Preset::builtin(name)))
                .collect(),
        }
    }

    /// Built-in catalog with presets overridden by a JSON document.
    ///
    /// The document is an array of presets; each one replaces the built-in
    /// definition of the same name.
    ///
    /// ```json
    /// [{ "name": "guest", "entries": [{ "rule": "guest_contact", "weight": 1.0, "critical": true }] }]
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: Vec<Preset> = serde_json::from_str(json)?;
        Ok(overrides
            .into_iter()
            .fold(Self::builtin(), |catalog, preset| catalog.with_preset(preset)))
    }

    /// Adds or replaces a preset, keyed by its name.
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.presets.insert(preset.name(), preset);
        self
    }

    /// Looks up a preset by name.
    pub fn get(&self, name: PresetName) -> Option<&Preset> {
        self.presets.get(&name)
    }

    /// Iterates over every preset in the catalog.
    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.values()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Every preset resolved into a shared, read-only policy.
#[derive(Debug, Clone)]
pub struct PolicySet {
    policies: BTreeMap<PresetName, Arc<Policy>>,
}

impl PolicySet {
    /// Resolves all presets; fails on the first missing or invalid one.
    pub fn resolve(catalog: &PresetCatalog, registry: &RuleRegistry) -> Result<Self> {
        let mut policies = BTreeMap::new();
        for name in PresetName::ALL {
            let preset = catalog.get(name).ok_or(PolicyError::MissingPreset(name))?;
            policies.insert(name, Arc::new(registry.resolve(preset)?));
        }
        Ok(Self { policies })
    }

    /// Built-in presets against the built-in rules.
    pub fn builtin(registry: &RuleRegistry) -> Result<Self> {
        Self::resolve(&PresetCatalog::builtin(), registry)
    }

    /// The policy for `name`. Every preset is present after `resolve`.
    pub fn get(&self, name: PresetName) -> Arc<Policy> {
        Arc::clone(&self.policies[&name])
    }
}
