//! Engine error types.
//!
//! Nothing here escapes [`Engine::evaluate`](crate::Engine::evaluate); these
//! errors are returned by explicit validation calls used for diagnostics.

use thiserror::Error;

/// Configuration problems detected by explicit validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Breaker thresholds are not strictly increasing.
    #[error(
        "circuit breaker thresholds must satisfy degraded_after < passive_after < open_after \
         (got {degraded_after}/{passive_after}/{open_after})"
    )]
    InvalidThresholds {
        /// Configured `degraded_after`.
        degraded_after: u32,
        /// Configured `passive_after`.
        passive_after: u32,
        /// Configured `open_after`.
        open_after: u32,
    },

    /// `reset_after_clean` of zero would reset on every evaluation.
    #[error("circuit breaker reset_after_clean must be at least 1")]
    ZeroResetAfterClean,

    /// A severity mode other than `standard`, `strict`, or `relaxed`.
    #[error("unknown severity mode: {0}")]
    UnknownSeverityMode(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
