//! Rule evaluation for the checkpoint workflow engine.
//!
//! A [`Policy`] is an ordered list of weighted [`Rule`]s. Running it against
//! an immutable [`Context`] evaluates every rule, folds rule faults into
//! critical failures and produces a [`PolicyReport`] with a confidence score.
//!
//! Named presets (standard, high-value, guest, internal) are plain data
//! resolved against a [`RuleRegistry`], so a new preset never needs new code.

pub mod context;
pub mod error;
pub mod policy;
pub mod preset;
pub mod registry;
pub mod report;
pub mod rule;
pub mod rules;
pub mod settings;
pub mod verdict;

pub use context::{
    Context, ContextBuilder, CustomerFacts, CustomerStatus, InventorySnapshot, ShippingFacts,
};
pub use error::{EvaluationFault, PolicyError};
pub use policy::{Policy, WeightedRule};
pub use preset::{Preset, PresetCatalog, PresetEntry, PresetName, PolicySet};
pub use registry::RuleRegistry;
pub use report::PolicyReport;
pub use rule::{AlwaysPass, Rule};
pub use settings::RuleSettings;
pub use verdict::Verdict;
