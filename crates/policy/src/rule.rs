//! The rule contract.

use crate::context::Context;
use crate::error::EvaluationFault;
use crate::verdict::Verdict;

/// A single business condition checked against a [`Context`].
///
/// Rules are stateless and must not depend on the verdict of any other rule.
/// A business condition that does not hold is an `Ok` failing verdict;
/// `Err` is reserved for a rule that cannot run at all, typically because a
/// fact it needs is absent.
pub trait Rule: Send + Sync {
    /// Stable identifier, also used as the registry key.
    fn name(&self) -> &str;

    fn evaluate(&self, ctx: &Context) -> Result<Verdict, EvaluationFault>;
}

/// Test double that passes every context.
///
/// Use it to pad a policy in tests or to stand in for a rule whose real
/// implementation is not under test. It is never part of a built-in preset.
#[derive(Debug, Clone)]
pub struct AlwaysPass {
    name: String,
}

impl AlwaysPass {
    /// Creates a rule that always passes under `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for AlwaysPass {
    fn default() -> Self {
        Self::named("always_pass")
    }
}

impl Rule for AlwaysPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _ctx: &Context) -> Result<Verdict, EvaluationFault> {
        Ok(Verdict::pass(self.name.as_str()))
    }
}
