//! Settings type definitions.
//!
//! Field names match the keys of `agentlint.yml`. Every field has a default,
//! so a partial (or empty) file is valid.

use std::collections::HashMap;

use agentlint_core::{PartialCircuitBreakerConfig, RuleSettings};
use serde::{Deserialize, Serialize};

/// Default severity mode name.
pub const DEFAULT_SEVERITY: &str = "standard";

/// How the active packs are chosen when `packs` is not set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    /// Detect packs from the project's files.
    #[default]
    Auto,
    /// Use only the `universal` pack.
    Manual,
}

/// Root settings, loaded from `agentlint.yml` over compiled defaults.
///
/// ```yaml
/// stack: auto
/// severity: standard
/// packs: [universal, python]
/// rules:
///   max-file-size: { limit: 300 }
/// circuit_breaker:
///   degraded_after: 5
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLintSettings {
    /// Pack selection strategy.
    pub stack: StackMode,
    /// Severity mode name. Kept as written; unknown names fall back to
    /// `standard` when the engine config is built.
    pub severity: String,
    /// Explicit pack list. Overrides detection when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packs: Option<Vec<String>>,
    /// Per-rule settings keyed by rule ID.
    pub rules: HashMap<String, RuleSettings>,
    /// Global circuit-breaker settings.
    pub circuit_breaker: PartialCircuitBreakerConfig,
}

impl Default for AgentLintSettings {
    fn default() -> Self {
        Self {
            stack: StackMode::Auto,
            severity: DEFAULT_SEVERITY.to_string(),
            packs: None,
            rules: HashMap::new(),
            circuit_breaker: PartialCircuitBreakerConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
