//! Output formatting for the agent hook protocol.

use std::collections::BTreeMap;

use agentlint_core::{CircuitBreakerRecord, CircuitState, Finding, Severity};
use agentlint_engine::EvaluationResult;
use serde_json::json;

/// Exit code telling the agent runtime to block the action.
pub const EXIT_BLOCK: u8 = 2;

const SECTIONS: &[(Severity, &str)] = &[
    (Severity::Error, "BLOCKED"),
    (Severity::Warning, "WARNINGS"),
    (Severity::Info, "INFO"),
];

/// Hook response for `result`, or `None` when there is nothing to say.
pub fn hook_output(result: &EvaluationResult) -> Option<String> {
    if result.findings.is_empty() {
        return None;
    }
    let mut lines = vec![String::new(), "AgentLint:".to_string()];
    for (severity, title) in SECTIONS {
        let mut section = result.at(*severity).peekable();
        if section.peek().is_none() {
            continue;
        }
        lines.push(format!("  {title}:"));
        for finding in section {
            lines.push(format!("    {}", entry(finding)));
            if let Some(suggestion) = &finding.suggestion {
                lines.push(format!("      -> {suggestion}"));
            }
        }
    }
    Some(json!({ "systemMessage": lines.join("\n") }).to_string())
}

/// Process exit code for `result`: [`EXIT_BLOCK`] when any ERROR remains.
pub fn exit_code(result: &EvaluationResult) -> u8 {
    if result.is_blocking() { EXIT_BLOCK } else { 0 }
}

/// Breaker records that are not `Active` in `after`, or failing that in
/// `before`. The final evaluation's clean pass can reset a record that
/// stayed tripped for most of the session.
pub fn tripped_breakers(
    before: &BTreeMap<String, CircuitBreakerRecord>,
    after: &BTreeMap<String, CircuitBreakerRecord>,
) -> BTreeMap<String, CircuitBreakerRecord> {
    let mut out = BTreeMap::new();
    for records in [before, after] {
        out.extend(
            records
                .iter()
                .filter(|(_, record)| record.state != CircuitState::Active)
                .map(|(rule_id, record)| (rule_id.clone(), record.clone())),
        );
    }
    out
}

/// End-of-session summary. `breakers` lists the rules whose breaker has
/// tripped.
pub fn session_report(
    result: &EvaluationResult,
    files_changed: usize,
    breakers: &BTreeMap<String, CircuitBreakerRecord>,
) -> String {
    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    let mut lines = vec![
        "AgentLint Session Report".to_string(),
        format!(
            "Files changed: {files_changed}  |  Rules evaluated: {}",
            result.rules_evaluated
        ),
        format!(
            "Passed: {}  |  Warnings: {warnings}  |  Blocked: {errors}",
            result.rules_evaluated.saturating_sub(result.findings.len())
        ),
    ];

    for (severity, title) in [
        (Severity::Error, "Blocked actions"),
        (Severity::Warning, "Warnings"),
        (Severity::Info, "Info"),
    ] {
        let section: Vec<_> = result.at(severity).map(entry).collect();
        if section.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{title}:"));
        lines.extend(section.into_iter().map(|e| format!("  {e}")));
    }

    if !breakers.is_empty() {
        lines.push(String::new());
        lines.push("Circuit breakers:".to_string());
        for (rule_id, record) in breakers {
            lines.push(format!(
                "  [{rule_id}] {} after {} fire(s)",
                record.state, record.fire_count
            ));
        }
    }
    lines.join("\n")
}

fn entry(finding: &Finding) -> String {
    format!("[{}] {}", finding.rule_id, finding.message)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn result(findings: Vec<Finding>, rules_evaluated: usize) -> EvaluationResult {
        EvaluationResult {
            findings,
            rules_evaluated,
        }
    }

    fn message(output: &str) -> String {
        let value: Value = serde_json::from_str(output).unwrap();
        value["systemMessage"].as_str().unwrap().to_string()
    }

    #[test]
    fn no_findings_no_output() {
        let empty = result(vec![], 7);
        assert!(hook_output(&empty).is_none());
        assert_eq!(exit_code(&empty), 0);
    }

    #[test]
    fn hook_output_groups_by_severity() {
        let findings = vec![
            Finding::new("no-push-to-main", Severity::Warning, "Direct push to 'main' detected"),
            Finding::new("no-force-push", Severity::Error, "Force push to 'main' is blocked")
                .with_suggestion("Use --force-with-lease on a feature branch"),
            Finding::new("token-budget", Severity::Info, "Session activity: 3 tool calls"),
        ];
        let result = result(findings, 7);
        let text = message(&hook_output(&result).unwrap());
        assert!(text.starts_with("\nAgentLint:"));
        insta::assert_snapshot!(text.trim_start(), @r"
        AgentLint:
          BLOCKED:
            [no-force-push] Force push to 'main' is blocked
              -> Use --force-with-lease on a feature branch
          WARNINGS:
            [no-push-to-main] Direct push to 'main' detected
          INFO:
            [token-budget] Session activity: 3 tool calls
        ");
        assert_eq!(exit_code(&result), EXIT_BLOCK);
    }

    #[test]
    fn warnings_alone_do_not_block() {
        let result = result(vec![Finding::new("r", Severity::Warning, "w")], 1);
        assert_eq!(exit_code(&result), 0);
        assert!(!message(&hook_output(&result).unwrap()).contains("BLOCKED"));
    }

    #[test]
    fn session_report_lists_tripped_breakers() {
        let mut records = BTreeMap::new();
        let _ = records.insert(
            "no-force-push".to_string(),
            CircuitBreakerRecord {
                fire_count: 6,
                state: CircuitState::Passive,
                ..CircuitBreakerRecord::default()
            },
        );
        let _ = records.insert(
            "no-skip-hooks".to_string(),
            CircuitBreakerRecord {
                fire_count: 1,
                ..CircuitBreakerRecord::default()
            },
        );
        let findings = vec![
            Finding::new("no-debug-artifacts", Severity::Warning, "Debug artifacts in app.js: console.log()"),
            Finding::new("no-todo-left", Severity::Info, "Found 2 TODO/FIXME comment(s) in app.js"),
        ];
        let breakers = tripped_breakers(&BTreeMap::new(), &records);
        let report = session_report(&result(findings, 3), 4, &breakers);
        insta::assert_snapshot!(report, @r"
        AgentLint Session Report
        Files changed: 4  |  Rules evaluated: 3
        Passed: 1  |  Warnings: 1  |  Blocked: 0

        Warnings:
          [no-debug-artifacts] Debug artifacts in app.js: console.log()

        Info:
          [no-todo-left] Found 2 TODO/FIXME comment(s) in app.js

        Circuit breakers:
          [no-force-push] passive after 6 fire(s)
        ");
    }

    #[test]
    fn passed_count_never_underflows() {
        let findings = vec![
            Finding::new("a", Severity::Error, "x"),
            Finding::new("a", Severity::Error, "y"),
        ];
        let report = session_report(&result(findings, 1), 0, &BTreeMap::new());
        assert!(report.contains("Passed: 0  |  Warnings: 0  |  Blocked: 2"));
    }

    #[test]
    fn tripped_before_a_reset_is_still_listed() {
        let open = CircuitBreakerRecord {
            fire_count: 10,
            state: CircuitState::Open,
            ..CircuitBreakerRecord::default()
        };
        let passive = CircuitBreakerRecord {
            fire_count: 7,
            state: CircuitState::Passive,
            ..CircuitBreakerRecord::default()
        };
        let before = BTreeMap::from([
            ("no-force-push".to_string(), open),
            ("no-skip-hooks".to_string(), passive.clone()),
        ]);
        let after = BTreeMap::from([
            ("no-force-push".to_string(), CircuitBreakerRecord::default()),
            (
                "no-skip-hooks".to_string(),
                CircuitBreakerRecord {
                    fire_count: 10,
                    state: CircuitState::Open,
                    ..passive
                },
            ),
        ]);

        let breakers = tripped_breakers(&before, &after);
        let summary: Vec<_> = breakers
            .iter()
            .map(|(id, r)| (id.as_str(), r.state, r.fire_count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("no-force-push", CircuitState::Open, 10),
                ("no-skip-hooks", CircuitState::Open, 10),
            ]
        );
    }
}
