//! Per-session mutable state.
//!
//! [`SessionState`] is the only value the engine mutates that outlives one
//! evaluation. The caller loads it before `evaluate()` and persists it after.
//! Circuit-breaker records are typed; everything else rules keep between
//! calls lives in free-form JSON namespaces (`token_budget`, `file_cache`,
//! `changed_files`, ...).
//!
//! Deserialization is lenient: a malformed breaker record is dropped on its
//! own and a `circuit_breaker` value that is not a map reads as empty. Bad
//! persisted data degrades to a fresh `Active` record, never to an error.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Session key holding the breaker records.
pub const CIRCUIT_BREAKER_KEY: &str = "circuit_breaker";

/// Session key holding the list of files changed in this session.
pub const CHANGED_FILES_KEY: &str = "changed_files";

/// Circuit-breaker state of one rule, ordered by how much it suppresses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CircuitState {
    /// Findings pass through unchanged.
    #[default]
    Active,
    /// ERROR findings are downgraded to WARNING.
    Degraded,
    /// ERROR findings are downgraded to INFO.
    Passive,
    /// Findings are dropped.
    Open,
}

impl CircuitState {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Passive => "passive",
            Self::Open => "open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a state transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// The fire count crossed a threshold.
    #[default]
    FireCount,
    /// The record was reset (clean streak or elapsed time).
    Reset,
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// State before the change.
    pub from: CircuitState,
    /// State after the change.
    pub to: CircuitState,
    /// Fire count when the change happened.
    pub at_count: u32,
    /// When the change happened.
    pub ts: DateTime<Utc>,
    /// Why it happened.
    #[serde(default)]
    pub reason: TransitionReason,
}

/// Persistent counters for one rule ID.
///
/// `state` is always the value the breaker computed from `fire_count`; it is
/// stored for reporting, not read back as an input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerRecord {
    /// ERROR findings counted since the last reset.
    pub fire_count: u32,
    /// Consecutive evaluations without an ERROR finding from this rule.
    pub clean_count: u32,
    /// First fire since the last reset.
    pub first_fire_ts: Option<DateTime<Utc>>,
    /// Most recent fire.
    pub last_fire_ts: Option<DateTime<Utc>>,
    /// Current state.
    pub state: CircuitState,
    /// State-change history, oldest first.
    pub transitions: Vec<StateTransition>,
}

impl CircuitBreakerRecord {
    /// Whether the record carries no live counters.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.fire_count == 0 && self.clean_count == 0 && self.state == CircuitState::Active
    }
}

/// State carried across evaluations of one agent session.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct SessionState {
    /// Breaker records keyed by rule ID.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub circuit_breaker: BTreeMap<String, CircuitBreakerRecord>,
    /// Free-form namespaces owned by individual rules and the CLI.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("breaker_records", &self.circuit_breaker.len())
            .field("namespaces", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SessionState {
    /// Empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.extra.insert(key.into(), value)
    }

    /// Remove and return the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.extra.remove(key)
    }

    /// Mutable JSON object under `key`, created if missing. A non-object
    /// value already stored there is replaced.
    pub fn namespace_mut(&mut self, key: &str) -> &mut Map<String, Value> {
        let slot = self
            .extra
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            warn!(namespace = key, "session namespace is not an object, replacing");
            *slot = Value::Object(Map::new());
        }
        match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was just set to an object"),
        }
    }

    /// Files changed during the session. Non-string entries are skipped.
    #[must_use]
    pub fn changed_files(&self) -> Vec<String> {
        self.get(CHANGED_FILES_KEY)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the changed-file list.
    pub fn set_changed_files(&mut self, files: Vec<String>) {
        let list = files.into_iter().map(Value::String).collect();
        let _ = self.insert(CHANGED_FILES_KEY, Value::Array(list));
    }

    /// Breaker record for `rule_id`, if one exists.
    #[must_use]
    pub fn breaker_record(&self, rule_id: &str) -> Option<&CircuitBreakerRecord> {
        self.circuit_breaker.get(rule_id)
    }
}

impl From<Value> for SessionState {
    fn from(value: Value) -> Self {
        let mut map = match value {
            Value::Object(map) => map,
            Value::Null => return Self::default(),
            other => {
                warn!(kind = value_kind(&other), "session state is not an object, starting fresh");
                return Self::default();
            }
        };

        let circuit_breaker = match map.remove(CIRCUIT_BREAKER_KEY) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(records)) => parse_records(records),
            Some(other) => {
                warn!(
                    kind = value_kind(&other),
                    "circuit_breaker session entry is not a map, treating as empty"
                );
                BTreeMap::new()
            }
        };

        Self {
            circuit_breaker,
            extra: map,
        }
    }
}

fn parse_records(records: Map<String, Value>) -> BTreeMap<String, CircuitBreakerRecord> {
    records
        .into_iter()
        .filter_map(|(rule_id, raw)| match serde_json::from_value(raw) {
            Ok(record) => Some((rule_id, record)),
            Err(e) => {
                warn!(rule_id = %rule_id, error = %e, "dropping malformed circuit breaker record");
                None
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
