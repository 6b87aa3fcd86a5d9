//! Activation filter: which registered rules run for a given event.

use std::collections::HashSet;

use agentlint_core::{HookEvent, Rule};
use tracing::debug;

use crate::config::EngineConfig;

/// Rules that apply to `event` under `config`, in registration order.
///
/// A rule runs when its pack is active, it is enabled, and it declares
/// `event`. A rule ID seen twice is kept only the first time.
pub fn active_rules<'a>(
    rules: &'a [Box<dyn Rule>],
    config: &EngineConfig,
    event: HookEvent,
) -> Vec<&'a dyn Rule> {
    let mut seen = HashSet::new();
    rules
        .iter()
        .map(|rule| &**rule)
        .filter(|rule| {
            if !config.is_pack_active(rule.pack()) || !rule.matches_event(event) {
                return false;
            }
            if !config.is_rule_enabled(rule.id()) {
                debug!(rule_id = rule.id(), "rule disabled by config");
                return false;
            }
            seen.insert(rule.id().to_string())
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use agentlint_core::{EvaluationContext, Finding, RuleSettings, SessionState, Severity};
    use serde_json::json;

    struct Stub {
        id: &'static str,
        pack: &'static str,
        events: &'static [HookEvent],
    }

    impl Rule for Stub {
        fn id(&self) -> &str {
            self.id
        }
        fn description(&self) -> &str {
            "stub"
        }
        fn severity(&self) -> Severity {
            Severity::Error
        }
        fn events(&self) -> &[HookEvent] {
            self.events
        }
        fn pack(&self) -> &str {
            self.pack
        }
        fn evaluate(&self, _: &EvaluationContext, _: &mut SessionState) -> Vec<Finding> {
            Vec::new()
        }
    }

    fn stub(id: &'static str, pack: &'static str, events: &'static [HookEvent]) -> Box<dyn Rule> {
        Box::new(Stub { id, pack, events })
    }

    fn ids(rules: &[&dyn Rule]) -> Vec<String> {
        rules.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn keeps_registration_order() {
        let rules = vec![
            stub("c", "universal", &[HookEvent::PreToolUse]),
            stub("a", "universal", &[HookEvent::PreToolUse]),
            stub("b", "universal", &[HookEvent::PreToolUse]),
        ];
        let active = active_rules(&rules, &EngineConfig::default(), HookEvent::PreToolUse);
        assert_eq!(ids(&active), vec!["c", "a", "b"]);
    }

    #[test]
    fn drops_inactive_pack_wrong_event_and_disabled() {
        let rules = vec![
            stub("py", "python", &[HookEvent::PreToolUse]),
            stub("stop-only", "universal", &[HookEvent::Stop]),
            stub("off", "universal", &[HookEvent::PreToolUse]),
            stub("on", "universal", &[HookEvent::PreToolUse, HookEvent::Stop]),
        ];
        let config = EngineConfig::default()
            .rule("off", RuleSettings::from(json!({"enabled": false})));
        let active = active_rules(&rules, &config, HookEvent::PreToolUse);
        assert_eq!(ids(&active), vec!["on"]);
    }

    #[test]
    fn duplicate_ids_run_once() {
        let rules = vec![
            stub("dup", "universal", &[HookEvent::PreToolUse]),
            stub("dup", "universal", &[HookEvent::PreToolUse]),
        ];
        let active = active_rules(&rules, &EngineConfig::default(), HookEvent::PreToolUse);
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn empty_input_empty_output() {
        assert!(active_rules(&[], &EngineConfig::default(), HookEvent::Stop).is_empty());
    }
}
