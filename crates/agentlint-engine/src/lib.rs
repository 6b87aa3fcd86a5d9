//! # agentlint-engine
//!
//! The rule evaluation pipeline. One call to [`Engine::evaluate`] runs:
//!
//! 1. [`filter`]: pick the registered rules whose pack is active, which are
//!    enabled, and which apply to the event
//! 2. each picked rule's predicate
//! 3. [`severity`]: remap every finding per the global severity mode
//! 4. [`breaker`]: degrade or suppress repeatedly firing ERROR rules
//!
//! Evaluation never fails. Configuration and session-state anomalies are
//! recovered locally and logged.

#![deny(unsafe_code)]

pub mod breaker;
pub mod config;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod severity;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use config::EngineConfig;
pub use engine::{Engine, EvaluationResult};
pub use errors::EngineError;
pub use severity::{SeverityMode, remap};
