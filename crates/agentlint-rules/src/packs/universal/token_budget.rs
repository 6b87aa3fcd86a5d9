//! Session activity tracking.
//!
//! Counters live in the `token_budget` namespace of the session state:
//!
//! ```json
//! {
//!   "session_start_time": "2026-01-01T09:00:00Z",
//!   "tool_invocations": { "Bash": 12, "Edit": 7 },
//!   "total_content_bytes": 48213,
//!   "total_calls": 19
//! }
//! ```

use agentlint_core::{EvaluationContext, Finding, HookEvent, Rule, SessionState, Severity};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Session state namespace.
pub const TOKEN_BUDGET_KEY: &str = "token_budget";

const DEFAULT_MAX_TOOL_INVOCATIONS: u64 = 200;
const DEFAULT_WARN_AT_PERCENT: u64 = 80;
const TOP_TOOLS: usize = 5;

/// Counts tool calls and written bytes; warns once at the configured share
/// of the budget and summarizes activity when the agent stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBudget;

impl Rule for TokenBudget {
    rule_metadata! {
        id: "token-budget",
        description: "Tracks session activity and warns on excessive tool invocations",
        severity: Warning,
        events: [PostToolUse, Stop],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, session: &mut SessionState) -> Vec<Finding> {
        let max = ctx
            .rule_option_u64(self.id(), "max_tool_invocations")
            .unwrap_or(DEFAULT_MAX_TOOL_INVOCATIONS);
        let now = Utc::now();
        let budget = session.namespace_mut(TOKEN_BUDGET_KEY);
        match ctx.event {
            HookEvent::PostToolUse => {
                let warn_pct = ctx
                    .rule_option_u64(self.id(), "warn_at_percent")
                    .unwrap_or(DEFAULT_WARN_AT_PERCENT);
                self.track(ctx, budget, max, warn_pct, now)
            }
            HookEvent::Stop => self.report(budget, max, now),
            _ => Vec::new(),
        }
    }
}

impl TokenBudget {
    fn track(
        &self,
        ctx: &EvaluationContext,
        budget: &mut Map<String, Value>,
        max: u64,
        warn_pct: u64,
        now: DateTime<Utc>,
    ) -> Vec<Finding> {
        let _ = budget
            .entry("session_start_time")
            .or_insert_with(|| Value::String(now.to_rfc3339()));

        let tool = if ctx.tool_name.is_empty() {
            "unknown"
        } else {
            ctx.tool_name.as_str()
        };
        let invocations = budget
            .entry("tool_invocations")
            .or_insert_with(|| Value::Object(Map::new()));
        if !invocations.is_object() {
            *invocations = Value::Object(Map::new());
        }
        let total = match invocations {
            Value::Object(counts) => {
                let count = counts
                    .get(tool)
                    .and_then(Value::as_u64)
                    .unwrap_or(0)
                    .saturating_add(1);
                let _ = counts.insert(tool.to_string(), Value::from(count));
                counts
                    .values()
                    .filter_map(Value::as_u64)
                    .fold(0, u64::saturating_add)
            }
            _ => 0,
        };

        let bytes = ctx.input_content().map_or(0, str::len) as u64;
        let total_bytes = counter(budget, "total_content_bytes").saturating_add(bytes);
        let _ = budget.insert("total_content_bytes".into(), Value::from(total_bytes));
        let _ = budget.insert("total_calls".into(), Value::from(total));

        // Saturates so a huge configured budget cannot overflow.
        if total != max.saturating_mul(warn_pct) / 100 {
            return Vec::new();
        }
        vec![
            self.finding(format!(
                "Session activity: {total}/{max} tool calls ({warn_pct}% of budget)"
            ))
            .with_suggestion("Consider wrapping up or breaking this into smaller tasks."),
        ]
    }

    fn report(&self, budget: &Map<String, Value>, max: u64, now: DateTime<Utc>) -> Vec<Finding> {
        let total = counter(budget, "total_calls");
        if total == 0 {
            return Vec::new();
        }

        let duration = budget
            .get("session_start_time")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|start| {
                let elapsed = (now - start.with_timezone(&Utc)).num_seconds().max(0);
                format!(" over {}m{}s", elapsed / 60, elapsed % 60)
            })
            .unwrap_or_default();

        let mut tools: Vec<(&str, u64)> = budget
            .get("tool_invocations")
            .and_then(Value::as_object)
            .map(|counts| {
                counts
                    .iter()
                    .filter_map(|(name, n)| Some((name.as_str(), n.as_u64()?)))
                    .collect()
            })
            .unwrap_or_default();
        tools.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let top = tools
            .iter()
            .take(TOP_TOOLS)
            .map(|(name, n)| format!("{name}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut finding = self.finding(format!(
            "Session activity: {total} tool calls{duration}, {} bytes written. Top: {top}",
            group_thousands(counter(budget, "total_content_bytes"))
        ));
        finding.severity = if total > max {
            Severity::Warning
        } else {
            Severity::Info
        };
        vec![finding]
    }
}

fn counter(budget: &Map<String, Value>, key: &str) -> u64 {
    budget.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// `1234567` -> `1,234,567`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use agentlint_core::RuleSettings;
    use chrono::TimeZone;
    use serde_json::json;

    fn post(tool: &str, input: Value) -> EvaluationContext {
        EvaluationContext::new(HookEvent::PostToolUse, tool, input, ".")
    }

    fn with_budget(ctx: EvaluationContext, max: u64, pct: u64) -> EvaluationContext {
        let mut config = HashMap::new();
        let _ = config.insert(
            "token-budget".to_string(),
            RuleSettings::from(json!({"max_tool_invocations": max, "warn_at_percent": pct})),
        );
        ctx.with_rule_config(config)
    }

    #[test]
    fn tracks_calls_per_tool_and_bytes() {
        let mut session = SessionState::new();
        let _ = TokenBudget.evaluate(&post("Write", json!({"content": "hello"})), &mut session);
        let _ = TokenBudget.evaluate(&post("Bash", json!({"command": "ls"})), &mut session);
        let _ = TokenBudget.evaluate(&post("Bash", json!({"command": "pwd"})), &mut session);

        let budget = session.get(TOKEN_BUDGET_KEY).unwrap();
        assert_eq!(budget["total_calls"], 3);
        assert_eq!(budget["total_content_bytes"], 5);
        assert_eq!(budget["tool_invocations"], json!({"Write": 1, "Bash": 2}));
        assert!(budget["session_start_time"].is_string());
    }

    #[test]
    fn warns_exactly_at_threshold() {
        let mut session = SessionState::new();
        let ctx = with_budget(post("Bash", json!({"command": "ls"})), 10, 50);
        let fired: Vec<usize> = (1..=8)
            .filter(|_| !TokenBudget.evaluate(&ctx, &mut session).is_empty())
            .collect();
        assert_eq!(fired, vec![5]);

        let mut session = SessionState::new();
        let findings: Vec<Finding> = (0..5)
            .flat_map(|_| TokenBudget.evaluate(&ctx, &mut session))
            .collect();
        assert_eq!(findings[0].message, "Session activity: 5/10 tool calls (50% of budget)");
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn huge_budget_never_warns() {
        let mut session = SessionState::new();
        let ctx = with_budget(post("Write", json!({"content": "x"})), u64::MAX, 80);
        for _ in 0..3 {
            assert!(TokenBudget.evaluate(&ctx, &mut session).is_empty());
        }
        assert_eq!(session.get(TOKEN_BUDGET_KEY).unwrap()["total_calls"], 3);
    }

    #[test]
    fn counters_saturate() {
        let mut session = SessionState::new();
        let budget = session.namespace_mut(TOKEN_BUDGET_KEY);
        let _ = budget.insert("tool_invocations".into(), json!({"Write": u64::MAX, "Bash": 1}));
        let _ = budget.insert("total_content_bytes".into(), json!(u64::MAX));

        let _ = TokenBudget.evaluate(&post("Write", json!({"content": "abc"})), &mut session);
        let budget = session.get(TOKEN_BUDGET_KEY).unwrap();
        assert_eq!(budget["tool_invocations"]["Write"], u64::MAX);
        assert_eq!(budget["total_calls"], u64::MAX);
        assert_eq!(budget["total_content_bytes"], u64::MAX);
    }

    #[test]
    fn stop_without_activity_is_silent() {
        let ctx = EvaluationContext::new(HookEvent::Stop, "", Value::Null, ".");
        assert!(TokenBudget.evaluate(&ctx, &mut SessionState::new()).is_empty());
    }

    #[test]
    fn report_summarizes_activity() {
        let budget = json!({
            "session_start_time": "2026-01-01T09:00:00Z",
            "tool_invocations": {"Read": 3, "Bash": 9, "Edit": 3, "Write": 1, "Grep": 2, "Glob": 1},
            "total_content_bytes": 1_234_567,
            "total_calls": 19
        });
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 9, 12, 5).unwrap();
        let findings = TokenBudget.report(budget.as_object().unwrap(), 200, now);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(
            findings[0].message,
            "Session activity: 19 tool calls over 12m5s, 1,234,567 bytes written. \
             Top: Bash: 9, Edit: 3, Read: 3, Grep: 2, Glob: 1"
        );
    }

    #[test]
    fn report_over_budget_is_warning() {
        let budget = json!({"tool_invocations": {"Bash": 3}, "total_calls": 3});
        let findings = TokenBudget.report(budget.as_object().unwrap(), 2, Utc::now());
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(
            findings[0].message,
            "Session activity: 3 tool calls, 0 bytes written. Top: Bash: 3"
        );
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
