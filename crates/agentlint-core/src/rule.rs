//! The rule predicate contract.
//!
//! A [`Rule`] is a heuristic check over one [`EvaluationContext`]. The
//! engine treats rules as interchangeable: it only reads their metadata to
//! decide whether to run them, then collects whatever findings they return.
//!
//! # Contract
//!
//! - An empty `Vec` means "pass".
//! - Missing optional context fields are valid input; never panic on them.
//! - The only side effects allowed are reads and writes to the rule's own
//!   namespace in [`SessionState`]. Other rules' keys must be tolerated.

use crate::context::EvaluationContext;
use crate::session::SessionState;
use crate::types::{Finding, HookEvent, Severity};

/// A registered guardrail rule.
pub trait Rule: Send + Sync {
    /// Stable identifier, e.g. `no-force-push`.
    fn id(&self) -> &str;

    /// One-line human description.
    fn description(&self) -> &str;

    /// Declared severity of the findings this rule produces.
    fn severity(&self) -> Severity;

    /// Lifecycle events the rule applies to.
    fn events(&self) -> &[HookEvent];

    /// Pack the rule belongs to.
    fn pack(&self) -> &str;

    /// Whether the circuit breaker must never downgrade or suppress this
    /// rule's findings. Default: `false`.
    fn non_degradable(&self) -> bool {
        false
    }

    /// Whether the rule applies to `event`.
    fn matches_event(&self, event: HookEvent) -> bool {
        self.events().contains(&event)
    }

    /// Run the check.
    fn evaluate(&self, ctx: &EvaluationContext, session: &mut SessionState) -> Vec<Finding>;

    /// A finding with this rule's ID and declared severity.
    fn finding(&self, message: impl Into<String>) -> Finding
    where
        Self: Sized,
    {
        Finding::new(self.id(), self.severity(), message)
    }
}

impl std::fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id())
            .field("pack", &self.pack())
            .field("severity", &self.severity())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
