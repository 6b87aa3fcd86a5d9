//! Error types for the core data model.

use thiserror::Error;

/// Errors raised while parsing core values from external input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A lifecycle event name that is not part of the hook protocol.
    #[error("unknown hook event: {0}")]
    UnknownEvent(String),

    /// A severity name other than `error`, `warning`, or `info`.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
