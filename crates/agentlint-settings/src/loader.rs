//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`AgentLintSettings::default()`]
//! 2. If a config file exists in the project, deep-merge its values over the
//!    defaults
//! 3. Apply `AGENTLINT_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use agentlint_engine::{CircuitBreakerConfig, EngineConfig, SeverityMode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::detector::detect_stack;
use crate::errors::Result;
use crate::types::{AgentLintSettings, StackMode};

/// Config file names, in lookup order.
pub const CONFIG_FILENAMES: &[&str] = &["agentlint.yml", "agentlint.yaml", ".agentlint.yml"];

/// Overrides the severity mode.
pub const SEVERITY_ENV: &str = "AGENTLINT_SEVERITY";
/// Overrides the pack list (comma separated).
pub const PACKS_ENV: &str = "AGENTLINT_PACKS";

/// First config file present in `project_dir`.
pub fn config_path(project_dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

/// Load the settings for `project_dir` with env var overrides.
///
/// A project without a config file gets the defaults. An unreadable or
/// malformed file is an error.
pub fn load_settings(project_dir: &Path) -> Result<AgentLintSettings> {
    load_settings_with(project_dir, |name| std::env::var(name).ok())
}

/// [`load_settings`] with overrides read through `lookup` instead of the
/// process environment.
pub fn load_settings_with(
    project_dir: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AgentLintSettings> {
    let mut settings = match config_path(project_dir) {
        Some(path) => load_settings_from_path(&path)?,
        None => {
            debug!(project_dir = %project_dir.display(), "no config file, using defaults");
            AgentLintSettings::default()
        }
    };
    apply_overrides(&mut settings, lookup);
    Ok(settings)
}

/// Load settings from a specific file, without env var overrides.
pub fn load_settings_from_path(path: &Path) -> Result<AgentLintSettings> {
    debug!(?path, "loading config file");
    let content = std::fs::read_to_string(path)?;
    let user: Value = if is_blank_yaml(&content) {
        Value::Null
    } else {
        serde_yaml::from_str(&content)?
    };
    let defaults = serde_json::to_value(AgentLintSettings::default())?;
    Ok(serde_json::from_value(deep_merge(defaults, user))?)
}

/// Only comments and whitespace.
fn is_blank_yaml(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (target, Value::Null) => target,
        (_, source) => source,
    }
}

/// Apply overrides read through `lookup`. Empty values are ignored.
pub fn apply_overrides(settings: &mut AgentLintSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(severity) = read(SEVERITY_ENV) {
        debug!(severity = %severity, "severity overridden from environment");
        settings.severity = severity.trim().to_string();
    }
    if let Some(packs) = read(PACKS_ENV) {
        let packs = parse_pack_list(&packs);
        debug!(?packs, "packs overridden from environment");
        settings.packs = Some(packs);
    }
}

/// Split a comma-separated pack list, dropping empty entries.
pub fn parse_pack_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl AgentLintSettings {
    /// Packs to activate: the explicit list when non-empty, else detected
    /// packs in auto mode, else `universal` alone.
    pub fn resolve_packs(&self, project_dir: &Path) -> Vec<String> {
        match (&self.packs, self.stack) {
            (Some(packs), _) if !packs.is_empty() => packs.clone(),
            (_, StackMode::Auto) => detect_stack(project_dir),
            (_, StackMode::Manual) => vec![agentlint_engine::config::DEFAULT_PACK.to_string()],
        }
    }

    /// Severity mode, falling back to `standard` for unknown names.
    pub fn severity_mode(&self) -> SeverityMode {
        SeverityMode::parse_lenient(&self.severity)
    }

    /// Build the engine configuration for `project_dir`.
    pub fn to_engine_config(&self, project_dir: &Path) -> EngineConfig {
        EngineConfig {
            active_packs: self.resolve_packs(project_dir),
            severity_mode: self.severity_mode(),
            rules: self.rules.clone(),
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }

    /// Strict validation for diagnostics: the severity name must be known
    /// and every resolved breaker config must have ordered thresholds.
    /// Evaluation itself tolerates all of these.
    pub fn validate(&self) -> Result<()> {
        let _: SeverityMode = self.severity.parse()?;
        CircuitBreakerConfig::resolve(&self.circuit_breaker, None).validate()?;

        let mut rule_ids: Vec<_> = self.rules.keys().collect();
        rule_ids.sort();
        for rule_id in rule_ids {
            let settings = &self.rules[rule_id];
            if let Some(partial) = &settings.circuit_breaker {
                CircuitBreakerConfig::resolve(&self.circuit_breaker, Some(partial))
                    .validate()
                    .inspect_err(|e| warn!(rule_id = %rule_id, error = %e, "invalid rule breaker config"))?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;
    use agentlint_engine::EngineError;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn project(config: Option<(&str, &str)>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some((name, content)) = config {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let merged = deep_merge(
            json!({"circuit_breaker": {"degraded_after": 3}, "severity": "standard"}),
            json!({"circuit_breaker": {"open_after": 12}}),
        );
        assert_eq!(merged["circuit_breaker"], json!({"degraded_after": 3, "open_after": 12}));
        assert_eq!(merged["severity"], "standard");
    }

    #[test]
    fn merge_array_replace() {
        let merged = deep_merge(json!({"packs": ["universal"]}), json!({"packs": ["python"]}));
        assert_eq!(merged["packs"], json!(["python"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(json!({"severity": "strict"}), json!({"severity": null}));
        assert_eq!(merged["severity"], "strict");
        assert_eq!(deep_merge(json!({"a": 1}), Value::Null), json!({"a": 1}));
    }

    // ── loading ─────────────────────────────────────────────────────

    #[test]
    fn missing_file_returns_defaults() {
        let dir = project(None);
        assert!(config_path(dir.path()).is_none());
        let settings = load_settings_with(dir.path(), env(&[])).unwrap();
        assert_eq!(settings, AgentLintSettings::default());
    }

    #[test]
    fn env_overrides_beat_the_file() {
        let dir = project(Some(("agentlint.yml", "severity: strict
packs: [python]
")));
        let settings = load_settings_with(dir.path(), env(&[(PACKS_ENV, "security")])).unwrap();
        assert_eq!(settings.severity, "strict");
        assert_eq!(settings.packs, Some(vec!["security".to_string()]));
    }

    #[test]
    fn config_file_lookup_order() {
        let dir = project(Some((".agentlint.yml", "severity: relaxed\n")));
        std::fs::write(dir.path().join("agentlint.yaml"), "severity: strict\n").unwrap();
        assert_eq!(config_path(dir.path()).unwrap(), dir.path().join("agentlint.yaml"));
    }

    #[test]
    fn yaml_values_merge_over_defaults() {
        let dir = project(Some((
            "agentlint.yml",
            "severity: strict\n\
             packs: [universal, python]\n\
             rules:\n  max-file-size:\n    limit: 300\n  no-force-push:\n    circuit_breaker:\n      degraded_after: 5\n\
             circuit_breaker:\n  open_after: 20\n",
        )));
        let settings = load_settings_from_path(&config_path(dir.path()).unwrap()).unwrap();
        assert_eq!(settings.severity, "strict");
        assert_eq!(settings.packs.as_deref(), Some(&["universal".to_string(), "python".to_string()][..]));
        assert_eq!(settings.rules["max-file-size"].option_u64("limit"), Some(300));
        assert_eq!(
            settings.rules["no-force-push"].circuit_breaker.as_ref().unwrap().degraded_after,
            Some(5)
        );
        assert_eq!(settings.circuit_breaker.open_after, Some(20));
        assert_eq!(settings.stack, StackMode::Auto);
    }

    #[test]
    fn empty_or_comment_only_file_is_defaults() {
        for content in ["", "# nothing yet\n\n", "---\n"] {
            let dir = project(Some(("agentlint.yml", content)));
            let settings = load_settings_from_path(&dir.path().join("agentlint.yml")).unwrap();
            assert_eq!(settings, AgentLintSettings::default(), "{content:?}");
        }
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = project(Some(("agentlint.yml", "packs: [universal\n")));
        let err = load_settings_from_path(&dir.path().join("agentlint.yml")).unwrap_err();
        assert_matches!(err, SettingsError::Yaml(_));
    }

    #[test]
    fn wrong_shape_is_an_error() {
        let dir = project(Some(("agentlint.yml", "packs: universal\n")));
        let err = load_settings_from_path(&dir.path().join("agentlint.yml")).unwrap_err();
        assert_matches!(err, SettingsError::Json(_));
    }

    #[test]
    fn wrongly_typed_breaker_values_fall_back() {
        let dir = project(Some((
            "agentlint.yml",
            "circuit_breaker:\n  degraded_after: lots\n  passive_after: 8\n  bogus: 1\n",
        )));
        let settings = load_settings_from_path(&dir.path().join("agentlint.yml")).unwrap();
        assert_eq!(settings.circuit_breaker.degraded_after, None);
        assert_eq!(settings.circuit_breaker.passive_after, Some(8));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn env_overrides_severity_and_packs() {
        let mut settings = AgentLintSettings::default();
        apply_overrides(
            &mut settings,
            env(&[(SEVERITY_ENV, " relaxed "), (PACKS_ENV, "universal, security,,")]),
        );
        assert_eq!(settings.severity, "relaxed");
        assert_eq!(settings.packs, Some(vec!["universal".to_string(), "security".to_string()]));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut settings = AgentLintSettings::default();
        apply_overrides(&mut settings, env(&[(SEVERITY_ENV, ""), (PACKS_ENV, "  ")]));
        assert_eq!(settings, AgentLintSettings::default());
    }

    // ── resolution ──────────────────────────────────────────────────

    #[test]
    fn explicit_packs_win_over_detection() {
        let dir = project(Some(("pyproject.toml", "")));
        let settings = AgentLintSettings {
            packs: Some(vec!["security".to_string()]),
            ..AgentLintSettings::default()
        };
        assert_eq!(settings.resolve_packs(dir.path()), vec!["security"]);
    }

    #[test]
    fn auto_detects_and_manual_is_universal() {
        let dir = project(Some(("pyproject.toml", "")));
        let auto = AgentLintSettings {
            packs: Some(Vec::new()),
            ..AgentLintSettings::default()
        };
        assert_eq!(auto.resolve_packs(dir.path()), vec!["universal", "python"]);

        let manual = AgentLintSettings {
            stack: StackMode::Manual,
            ..AgentLintSettings::default()
        };
        assert_eq!(manual.resolve_packs(dir.path()), vec!["universal"]);
    }

    #[test]
    fn engine_config_carries_everything() {
        let dir = project(None);
        let settings: AgentLintSettings = serde_json::from_value(json!({
            "stack": "manual",
            "severity": "loud",
            "rules": {"no-todo-left": {"enabled": false}},
            "circuit_breaker": {"enabled": false}
        }))
        .unwrap();
        let config = settings.to_engine_config(dir.path());
        assert_eq!(config.active_packs, vec!["universal"]);
        assert_eq!(config.severity_mode, SeverityMode::Standard);
        assert!(!config.is_rule_enabled("no-todo-left"));
        assert_eq!(config.circuit_breaker.enabled, Some(false));
    }

    // ── validation ──────────────────────────────────────────────────

    #[test]
    fn validate_accepts_defaults() {
        assert!(AgentLintSettings::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_severity() {
        let settings = AgentLintSettings {
            severity: "loud".to_string(),
            ..AgentLintSettings::default()
        };
        assert_matches!(
            settings.validate(),
            Err(SettingsError::Engine(EngineError::UnknownSeverityMode(s))) if s == "loud"
        );
    }

    #[test]
    fn validate_checks_per_rule_breaker_against_global() {
        let settings: AgentLintSettings = serde_json::from_value(json!({
            "circuit_breaker": {"passive_after": 4},
            "rules": {"no-force-push": {"circuit_breaker": {"degraded_after": 4}}}
        }))
        .unwrap();
        assert_matches!(
            settings.validate(),
            Err(SettingsError::Engine(EngineError::InvalidThresholds { degraded_after: 4, passive_after: 4, .. }))
        );
    }
}
