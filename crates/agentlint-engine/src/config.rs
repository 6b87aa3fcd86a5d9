//! Resolved engine configuration.
//!
//! Built by the settings loader (or directly in tests). The engine never
//! reads files or the environment itself.

use std::collections::HashMap;

use agentlint_core::{PartialCircuitBreakerConfig, RuleSettings};

use crate::severity::SeverityMode;

/// Pack enabled when nothing else is configured.
pub const DEFAULT_PACK: &str = "universal";

/// Everything the engine needs to decide what runs and how findings are
/// reported.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Packs whose rules may run.
    pub active_packs: Vec<String>,
    /// Global severity remapping.
    pub severity_mode: SeverityMode,
    /// Per-rule settings keyed by rule ID.
    pub rules: HashMap<String, RuleSettings>,
    /// Global circuit-breaker settings; per-rule settings override these.
    pub circuit_breaker: PartialCircuitBreakerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            active_packs: vec![DEFAULT_PACK.to_string()],
            severity_mode: SeverityMode::default(),
            rules: HashMap::new(),
            circuit_breaker: PartialCircuitBreakerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Config with the given packs and every other setting at its default.
    pub fn with_packs<I, S>(packs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active_packs: packs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the severity mode.
    #[must_use]
    pub fn severity_mode(mut self, mode: SeverityMode) -> Self {
        self.severity_mode = mode;
        self
    }

    /// Set the settings for one rule.
    #[must_use]
    pub fn rule(mut self, rule_id: impl Into<String>, settings: RuleSettings) -> Self {
        let _ = self.rules.insert(rule_id.into(), settings);
        self
    }

    /// Set the global circuit-breaker settings.
    #[must_use]
    pub fn circuit_breaker(mut self, global: PartialCircuitBreakerConfig) -> Self {
        self.circuit_breaker = global;
        self
    }

    /// Whether `pack` is active.
    #[must_use]
    pub fn is_pack_active(&self, pack: &str) -> bool {
        self.active_packs.iter().any(|p| p == pack)
    }

    /// Whether `rule_id` is enabled. Rules without settings are enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules.get(rule_id).is_none_or(RuleSettings::is_enabled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
