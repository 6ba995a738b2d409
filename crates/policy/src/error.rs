//! Policy error types.

use thiserror::Error;

use crate::preset::PresetName;

/// Raised by a rule that cannot run because an input it needs is missing.
///
/// This is distinct from a business rejection, which is an ordinary failing
/// verdict. [`crate::Policy::run`] absorbs every fault into a critical
/// failing verdict; it never reaches the caller as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationFault {
    /// A fact the rule depends on is absent from the context.
    #[error("missing fact: {0}")]
    MissingFact(String),

    /// The rule panicked while evaluating.
    #[error("rule panicked: {0}")]
    Panicked(String),

    /// Any other condition that prevented evaluation.
    #[error("{0}")]
    Other(String),
}

/// Errors raised while assembling policies from presets.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A preset names a rule the registry does not know.
    #[error("Preset '{preset}' references unknown rule '{rule}'")]
    UnknownRule { preset: String, rule: String },

    /// A preset entry carries a weight that is not a positive finite number.
    #[error("Rule '{rule}' has invalid weight {weight}")]
    InvalidWeight { rule: String, weight: f64 },

    /// The catalog has no definition for a preset.
    #[error("No preset named '{0}'")]
    MissingPreset(PresetName),

    /// A preset catalog document could not be parsed.
    #[error("Invalid preset catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
