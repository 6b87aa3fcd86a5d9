//! Test-suite hygiene: weakened tests and long stretches of edits without a
//! test run.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;
use serde_json::Value;

use crate::util::{WRITE_TOOLS, bash_command, re, written_content};

/// Session state namespace of the drift detector.
pub const DRIFT_KEY: &str = "drift_detector";

const DEFAULT_DRIFT_THRESHOLD: u64 = 10;
const TEST_RUNNERS: &[&str] = &["pytest", "vitest", "jest", "npm test", "make test", "cargo test"];

static TEST_FILE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)(?:^|/)(?:test_|tests?/|spec_|__tests__/|.*\.test\.|.*\.spec\.)")
});

/// Weakening patterns with the message and suggestion reported for each.
static WEAKENING: LazyLock<Vec<(Regex, &'static str, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            re(r"@pytest\.mark\.skip\b"),
            "Test skip marker detected: @pytest.mark.skip",
            "Fix the test instead of skipping it, or use @pytest.mark.xfail with a reason.",
        ),
        (
            re(r"@unittest\.skip\b"),
            "Test skip marker detected: @unittest.skip",
            "Fix the test instead of skipping it.",
        ),
        (
            re(r"\b(?:it|test|describe)\.skip\b"),
            "Test skip detected: .skip()",
            "Fix the test instead of skipping it.",
        ),
        (
            re(r"\bassert\s+True\b"),
            "Trivially passing assertion: assert True",
            "Replace 'assert True' with a meaningful assertion.",
        ),
        (
            re(r"\bself\.assertTrue\s*\(\s*True\s*\)"),
            "Trivially passing assertion: self.assertTrue(True)",
            "Replace 'assertTrue(True)' with a meaningful assertion.",
        ),
        (
            re(r"(?i)\bexpect\s*\(\s*true\s*\)\s*\.toBe\s*\(\s*true\s*\)"),
            "Trivially passing assertion: expect(true).toBe(true)",
            "Replace with a meaningful expectation.",
        ),
        (
            re(r"(?m)^\s*#\s*assert\b"),
            "Commented-out assertion detected",
            "Remove or restore commented-out assertions instead of leaving dead test code.",
        ),
        (
            re(r"(?m)^\s*//\s*expect\b"),
            "Commented-out expectation detected",
            "Remove or restore commented-out expectations instead of leaving dead test code.",
        ),
        (
            re(r"(?m)@pytest\.mark\.xfail\s*(?:\(\s*\))?$"),
            "@pytest.mark.xfail without reason",
            "Add a reason parameter: @pytest.mark.xfail(reason='...')",
        ),
        (
            re(r"(?m)def\s+test_\w+\s*\([^)]*\)\s*:\s*\n\s+pass\b"),
            "Empty test function detected (pass only)",
            "Implement the test or remove the empty placeholder.",
        ),
    ]
});

/// Warns when a test file is written with skipped, trivial or commented-out
/// tests. One finding per pattern kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTestWeakening;

impl Rule for NoTestWeakening {
    rule_metadata! {
        id: "no-test-weakening",
        description: "Warns when tests are skipped, trivialized, or commented out",
        severity: Warning,
        events: [PreToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        if !ctx.is_tool(WRITE_TOOLS) {
            return Vec::new();
        }
        let Some(path) = ctx.file_path().filter(|p| TEST_FILE.is_match(p)) else {
            return Vec::new();
        };
        let Some(content) = written_content(ctx).filter(|c| !c.is_empty()) else {
            return Vec::new();
        };

        WEAKENING
            .iter()
            .filter(|(pattern, _, _)| pattern.is_match(content))
            .map(|(_, message, suggestion)| {
                self.finding(*message)
                    .with_file_path(Some(path))
                    .with_suggestion(*suggestion)
            })
            .collect()
    }
}

/// Counts file writes since the last test run and warns once more than
/// `threshold` have piled up.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftDetector;

impl Rule for DriftDetector {
    rule_metadata! {
        id: "drift-detector",
        description: "Warns when many edits happen without running tests",
        severity: Warning,
        events: [PostToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, session: &mut SessionState) -> Vec<Finding> {
        let threshold = ctx
            .rule_option_u64(self.id(), "threshold")
            .unwrap_or(DEFAULT_DRIFT_THRESHOLD);
        let drift = session.namespace_mut(DRIFT_KEY);

        if bash_command(ctx).is_some_and(|c| TEST_RUNNERS.iter().any(|r| c.contains(r))) {
            let _ = drift.insert("files_edited".into(), Value::from(0_u64));
            let _ = drift.insert("last_test_run".into(), Value::Bool(true));
            return Vec::new();
        }

        let mut edited = drift.get("files_edited").and_then(Value::as_u64).unwrap_or(0);
        if ctx.is_tool(WRITE_TOOLS) {
            edited = edited.saturating_add(1);
            let _ = drift.insert("files_edited".into(), Value::from(edited));
            let _ = drift.insert("last_test_run".into(), Value::Bool(false));
        }
        let tested = drift.get("last_test_run").and_then(Value::as_bool).unwrap_or(true);

        if edited <= threshold || tested {
            return Vec::new();
        }
        vec![
            self.finding(format!("Edited {edited} files without running tests"))
                .with_suggestion("Consider running your test suite to catch regressions early."),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
