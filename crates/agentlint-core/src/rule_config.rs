//! Typed per-rule configuration.
//!
//! Both types are parsed leniently from arbitrary JSON/YAML values: a key
//! with the wrong type is ignored (so the default applies) and logged at
//! `warn`, never rejected. Configuration mistakes must not stop an agent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Keys recognised inside a `circuit_breaker` map.
const BREAKER_KEYS: &[&str] = &[
    "enabled",
    "degraded_after",
    "passive_after",
    "open_after",
    "reset_after_clean",
    "reset_after_minutes",
];

/// Partial circuit-breaker settings. Every field is optional; unset fields
/// inherit from the layer beneath (global settings, then defaults).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct PartialCircuitBreakerConfig {
    /// Whether the breaker tracks this rule at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Fire count at which ERROR findings become WARNING.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_after: Option<u32>,
    /// Fire count at which ERROR findings become INFO.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive_after: Option<u32>,
    /// Fire count at which findings are suppressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_after: Option<u32>,
    /// Consecutive clean evaluations that reset the breaker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_after_clean: Option<u32>,
    /// Minutes since the last fire after which the breaker resets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_after_minutes: Option<u32>,
}

impl PartialCircuitBreakerConfig {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Value> for PartialCircuitBreakerConfig {
    fn from(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Self::default(),
            other => {
                warn!(value = %other, "circuit_breaker config is not a mapping, ignoring");
                return Self::default();
            }
        };

        for key in map.keys() {
            if !BREAKER_KEYS.contains(&key.as_str()) {
                warn!(key = %key, "unknown circuit_breaker key, ignoring");
            }
        }

        Self {
            enabled: read_bool(&map, "enabled"),
            degraded_after: read_u32(&map, "degraded_after"),
            passive_after: read_u32(&map, "passive_after"),
            open_after: read_u32(&map, "open_after"),
            reset_after_clean: read_u32(&map, "reset_after_clean"),
            reset_after_minutes: read_u32(&map, "reset_after_minutes"),
        }
    }
}

/// Settings for one rule, from the `rules:` section of the config file.
///
/// `enabled` and `circuit_breaker` are interpreted by the engine; every
/// other key is an option for the rule itself (e.g. `limit` for
/// `max-file-size`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct RuleSettings {
    /// Explicit enablement. `None` means enabled.
    pub enabled: Option<bool>,
    /// Per-rule circuit-breaker overrides.
    pub circuit_breaker: Option<PartialCircuitBreakerConfig>,
    /// Rule-specific options.
    pub options: Map<String, Value>,
}

impl RuleSettings {
    /// Whether the rule is enabled (default `true`).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Raw option value.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Unsigned integer option; wrongly-typed values read as absent.
    #[must_use]
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(Value::as_u64)
    }

    /// Boolean option; wrongly-typed values read as absent.
    #[must_use]
    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(Value::as_bool)
    }

    /// List-of-strings option. Non-string entries are skipped.
    #[must_use]
    pub fn option_str_list(&self, key: &str) -> Option<Vec<String>> {
        let items = self.options.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect(),
        )
    }
}

impl From<Value> for RuleSettings {
    fn from(value: Value) -> Self {
        let mut map = match value {
            Value::Object(map) => map,
            Value::Null => return Self::default(),
            other => {
                warn!(value = %other, "rule settings are not a mapping, ignoring");
                return Self::default();
            }
        };

        let enabled = match map.remove("enabled") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(b),
            Some(other) => {
                warn!(value = %other, "rule `enabled` is not a boolean, ignoring");
                None
            }
        };
        let circuit_breaker = map
            .remove("circuit_breaker")
            .map(PartialCircuitBreakerConfig::from);

        Self {
            enabled,
            circuit_breaker,
            options: map,
        }
    }
}

impl From<RuleSettings> for Value {
    fn from(settings: RuleSettings) -> Self {
        let mut map = settings.options;
        if let Some(enabled) = settings.enabled {
            let _ = map.insert("enabled".into(), Value::Bool(enabled));
        }
        if let Some(cb) = settings.circuit_breaker {
            let cb_value = serde_json::to_value(cb).unwrap_or(Value::Null);
            let _ = map.insert("circuit_breaker".into(), cb_value);
        }
        Value::Object(map)
    }
}

fn read_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    let value = map.get(key)?;
    let parsed = value.as_bool();
    if parsed.is_none() && !value.is_null() {
        warn!(key, %value, "circuit_breaker value is not a boolean, using default");
    }
    parsed
}

fn read_u32(map: &Map<String, Value>, key: &str) -> Option<u32> {
    let value = map.get(key)?;
    let parsed = value.as_u64().and_then(|n| u32::try_from(n).ok());
    if parsed.is_none() && !value.is_null() {
        warn!(key, %value, "circuit_breaker value is not a non-negative integer, using default");
    }
    parsed
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_reads_known_keys() {
        let cfg = PartialCircuitBreakerConfig::from(json!({
            "enabled": false,
            "degraded_after": 5,
            "reset_after_minutes": 60
        }));
        assert_eq!(cfg.enabled, Some(false));
        assert_eq!(cfg.degraded_after, Some(5));
        assert_eq!(cfg.reset_after_minutes, Some(60));
        assert_eq!(cfg.passive_after, None);
    }

    #[test]
    fn partial_ignores_wrong_types() {
        let cfg = PartialCircuitBreakerConfig::from(json!({
            "enabled": "yes",
            "degraded_after": "three",
            "passive_after": -1,
            "open_after": 12
        }));
        assert_eq!(cfg.enabled, None);
        assert_eq!(cfg.degraded_after, None);
        assert_eq!(cfg.passive_after, None);
        assert_eq!(cfg.open_after, Some(12));
    }

    #[test]
    fn partial_ignores_unknown_keys() {
        let cfg = PartialCircuitBreakerConfig::from(json!({"explode_after": 1}));
        assert!(cfg.is_empty());
    }

    #[test]
    fn partial_from_non_mapping_is_empty() {
        assert!(PartialCircuitBreakerConfig::from(json!(7)).is_empty());
        assert!(PartialCircuitBreakerConfig::from(Value::Null).is_empty());
    }

    #[test]
    fn partial_deserializes_from_json_text() {
        let cfg: PartialCircuitBreakerConfig =
            serde_json::from_str(r#"{"open_after": 4, "bogus": true}"#).unwrap();
        assert_eq!(cfg.open_after, Some(4));
    }

    #[test]
    fn rule_settings_split_engine_keys_from_options() {
        let settings = RuleSettings::from(json!({
            "enabled": false,
            "limit": 300,
            "circuit_breaker": {"degraded_after": 2}
        }));
        assert!(!settings.is_enabled());
        assert_eq!(settings.option_u64("limit"), Some(300));
        assert_eq!(settings.circuit_breaker.as_ref().unwrap().degraded_after, Some(2));
        assert!(settings.option("enabled").is_none());
    }

    #[test]
    fn rule_settings_default_enabled() {
        let settings = RuleSettings::from(json!({"limit": 10}));
        assert!(settings.is_enabled());
        assert!(RuleSettings::default().is_enabled());
    }

    #[test]
    fn rule_settings_non_bool_enabled_is_ignored() {
        let settings = RuleSettings::from(json!({"enabled": "no"}));
        assert_eq!(settings.enabled, None);
        assert!(settings.is_enabled());
    }

    #[test]
    fn rule_settings_string_list_skips_non_strings() {
        let settings = RuleSettings::from(json!({"allowed_hosts": ["a.com", 3, "b.com"]}));
        assert_eq!(
            settings.option_str_list("allowed_hosts").unwrap(),
            vec!["a.com".to_string(), "b.com".to_string()]
        );
    }

    #[test]
    fn rule_settings_serialize_round_trip() {
        let original = RuleSettings::from(json!({
            "enabled": true,
            "limit": 42,
            "circuit_breaker": {"open_after": 20}
        }));
        let value = serde_json::to_value(original.clone()).unwrap();
        let reparsed: RuleSettings = serde_json::from_value(value).unwrap();
        assert_eq!(reparsed, original);
    }
}
