//! Circuit-breaker thresholds and their resolution from layered settings.

use agentlint_core::{CircuitState, PartialCircuitBreakerConfig};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Fully resolved breaker settings for one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Whether the breaker tracks the rule.
    pub enabled: bool,
    /// Fire count at which the rule becomes [`CircuitState::Degraded`].
    pub degraded_after: u32,
    /// Fire count at which the rule becomes [`CircuitState::Passive`].
    pub passive_after: u32,
    /// Fire count at which the rule becomes [`CircuitState::Open`].
    pub open_after: u32,
    /// Consecutive clean evaluations that reset the record.
    pub reset_after_clean: u32,
    /// Minutes since the last fire after which the record resets.
    pub reset_after_minutes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            degraded_after: 3,
            passive_after: 6,
            open_after: 10,
            reset_after_clean: 5,
            reset_after_minutes: 30,
        }
    }
}

impl CircuitBreakerConfig {
    /// Overlay the fields set in `partial`.
    #[must_use]
    pub fn merge(self, partial: &PartialCircuitBreakerConfig) -> Self {
        Self {
            enabled: partial.enabled.unwrap_or(self.enabled),
            degraded_after: partial.degraded_after.unwrap_or(self.degraded_after),
            passive_after: partial.passive_after.unwrap_or(self.passive_after),
            open_after: partial.open_after.unwrap_or(self.open_after),
            reset_after_clean: partial.reset_after_clean.unwrap_or(self.reset_after_clean),
            reset_after_minutes: partial.reset_after_minutes.unwrap_or(self.reset_after_minutes),
        }
    }

    /// Defaults, then `global`, then `per_rule`; later layers win key by key.
    #[must_use]
    pub fn resolve(
        global: &PartialCircuitBreakerConfig,
        per_rule: Option<&PartialCircuitBreakerConfig>,
    ) -> Self {
        let base = Self::default().merge(global);
        match per_rule {
            Some(per_rule) => base.merge(per_rule),
            None => base,
        }
    }

    /// Check that thresholds are strictly increasing and the clean streak
    /// is non-zero.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.degraded_after < self.passive_after && self.passive_after < self.open_after) {
            return Err(EngineError::InvalidThresholds {
                degraded_after: self.degraded_after,
                passive_after: self.passive_after,
                open_after: self.open_after,
            });
        }
        if self.reset_after_clean == 0 {
            return Err(EngineError::ZeroResetAfterClean);
        }
        Ok(())
    }

    /// State implied by `fire_count`. Thresholds are checked from the most
    /// suppressive down, so inverted thresholds resolve to the highest state
    /// whose threshold is met.
    #[must_use]
    pub fn state_for(&self, fire_count: u32) -> CircuitState {
        if fire_count >= self.open_after {
            CircuitState::Open
        } else if fire_count >= self.passive_after {
            CircuitState::Passive
        } else if fire_count >= self.degraded_after {
            CircuitState::Degraded
        } else {
            CircuitState::Active
        }
    }

    /// Reset window as a `chrono` duration.
    #[must_use]
    pub fn reset_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.reset_after_minutes))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn partial(value: serde_json::Value) -> PartialCircuitBreakerConfig {
        PartialCircuitBreakerConfig::from(value)
    }

    #[test]
    fn defaults() {
        let cfg = CircuitBreakerConfig::default();
        assert!(cfg.enabled);
        assert_eq!(
            (cfg.degraded_after, cfg.passive_after, cfg.open_after),
            (3, 6, 10)
        );
        assert_eq!((cfg.reset_after_clean, cfg.reset_after_minutes), (5, 30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn per_rule_wins_key_by_key() {
        let global = partial(serde_json::json!({"degraded_after": 4, "open_after": 20}));
        let per_rule = partial(serde_json::json!({"degraded_after": 2}));
        let cfg = CircuitBreakerConfig::resolve(&global, Some(&per_rule));
        assert_eq!(cfg.degraded_after, 2);
        assert_eq!(cfg.open_after, 20);
        assert_eq!(cfg.passive_after, 6);
    }

    #[test]
    fn resolve_without_overrides_is_default() {
        let cfg = CircuitBreakerConfig::resolve(&PartialCircuitBreakerConfig::default(), None);
        assert_eq!(cfg, CircuitBreakerConfig::default());
    }

    #[test]
    fn state_for_default_thresholds() {
        let cfg = CircuitBreakerConfig::default();
        assert_eq!(cfg.state_for(0), CircuitState::Active);
        assert_eq!(cfg.state_for(2), CircuitState::Active);
        assert_eq!(cfg.state_for(3), CircuitState::Degraded);
        assert_eq!(cfg.state_for(5), CircuitState::Degraded);
        assert_eq!(cfg.state_for(6), CircuitState::Passive);
        assert_eq!(cfg.state_for(9), CircuitState::Passive);
        assert_eq!(cfg.state_for(10), CircuitState::Open);
        assert_eq!(cfg.state_for(1000), CircuitState::Open);
    }

    #[test]
    fn inverted_thresholds_fail_validation_and_resolve_descending() {
        let cfg = CircuitBreakerConfig {
            degraded_after: 8,
            passive_after: 4,
            ..CircuitBreakerConfig::default()
        };
        assert_matches!(cfg.validate(), Err(EngineError::InvalidThresholds { .. }));
        // passive is checked before degraded
        assert_eq!(cfg.state_for(5), CircuitState::Passive);
        assert_eq!(cfg.state_for(3), CircuitState::Active);
    }

    #[test]
    fn zero_reset_after_clean_fails_validation() {
        let cfg = CircuitBreakerConfig {
            reset_after_clean: 0,
            ..CircuitBreakerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(EngineError::ZeroResetAfterClean));
    }
}
