//! # agentlint-core
//!
//! Foundation types for the AgentLint guardrail engine.
//!
//! - [`types`]: severities, lifecycle events, findings
//! - [`context`]: the per-call [`EvaluationContext`](context::EvaluationContext)
//! - [`session`]: persistent [`SessionState`](session::SessionState) and circuit-breaker records
//! - [`rule_config`]: typed per-rule configuration
//! - [`rule`]: the [`Rule`](rule::Rule) predicate contract
//! - [`logging`]: `tracing` subscriber setup and test capture

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod logging;
pub mod rule;
pub mod rule_config;
pub mod session;
pub mod types;

pub use context::EvaluationContext;
pub use errors::CoreError;
pub use rule::Rule;
pub use rule_config::{PartialCircuitBreakerConfig, RuleSettings};
pub use session::{
    CircuitBreakerRecord, CircuitState, SessionState, StateTransition, TransitionReason,
};
pub use types::{Finding, HookEvent, Severity};
