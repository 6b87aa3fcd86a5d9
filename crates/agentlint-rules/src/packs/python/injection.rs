//! Injection risks: SQL built by string interpolation, shell execution.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;
use tracing::warn;

use super::python_write;
use crate::util::{file_name, line_at, re};

const SQL_KEYWORDS: &str = "SELECT|INSERT|UPDATE|DELETE|DROP|ALTER|CREATE";

/// Interpolation shapes with the label reported for each, in check order.
static SQL_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            re(&format!(r#"(?i)f['"](?:{SQL_KEYWORDS})\b"#)),
            "f-string SQL interpolation",
        ),
        (
            re(&format!(r#"(?i)['"](?:{SQL_KEYWORDS})\b[^'"]*['"]\.format\s*\("#)),
            ".format() SQL interpolation",
        ),
        (
            re(&format!(r#"(?i)['"](?:{SQL_KEYWORDS})\b[^'"]*['"]\s*\+"#)),
            "string concatenation in SQL",
        ),
        (
            re(&format!(r#"(?i)['"](?:{SQL_KEYWORDS})\b[^'"]*%[sd][^'"]*['"]\s*%"#)),
            "% operator SQL interpolation",
        ),
    ]
});

static OS_SHELL: LazyLock<Regex> = LazyLock::new(|| re(r"\bos\.(?:system|popen)\s*\("));
static SUBPROCESS_SHELL: LazyLock<Regex> =
    LazyLock::new(|| re(r"\bsubprocess\.(call|run|Popen)\s*\([^)]*shell\s*=\s*True"));

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Test modules and raw SQL files build queries on purpose.
fn is_test_or_sql_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".sql") || lower.contains("/test") || file_name(&lower).contains("test_")
}

/// f-string pattern for the user's `extra_keywords`.
fn extra_keyword_pattern(keywords: &[String]) -> Option<Regex> {
    if keywords.is_empty() {
        return None;
    }
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r#"(?i)f['"](?:{alternation})\b"#))
        .inspect_err(|e| warn!(error = %e, "ignoring extra_keywords for no-sql-injection"))
        .ok()
}

/// Blocks SQL assembled with f-strings, `.format()`, `+` or `%`. One finding
/// per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSqlInjection;

impl Rule for NoSqlInjection {
    rule_metadata! {
        id: "no-sql-injection",
        description: "Prevents SQL injection via string interpolation",
        severity: Error,
        events: [PreToolUse],
        pack: "python",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = python_write(ctx) else {
            return Vec::new();
        };
        if is_test_or_sql_file(path) {
            return Vec::new();
        }
        let extra = ctx
            .rule_option_str_list(self.id(), "extra_keywords")
            .and_then(|keywords| extra_keyword_pattern(&keywords));
        let patterns: Vec<(&Regex, &str)> = SQL_PATTERNS
            .iter()
            .map(|(pattern, label)| (pattern, *label))
            .chain(extra.iter().map(|p| (p, "f-string interpolation with custom keyword")))
            .collect();

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !is_comment(line))
            .filter_map(|(i, line)| {
                let (_, label) = patterns.iter().find(|(p, _)| p.is_match(line))?;
                Some(
                    self.finding(format!("Possible SQL injection: {label}"))
                        .with_file_path(Some(path))
                        .with_line(i + 1)
                        .with_suggestion("Use parameterized queries instead of string interpolation."),
                )
            })
            .collect()
    }
}

/// Blocks `os.system`/`os.popen` and `subprocess` calls with `shell=True`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnsafeShell;

impl Rule for NoUnsafeShell {
    rule_metadata! {
        id: "no-unsafe-shell",
        description: "Prevents unsafe shell execution via subprocess with shell=True",
        severity: Error,
        events: [PreToolUse],
        pack: "python",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = python_write(ctx) else {
            return Vec::new();
        };

        let mut findings: Vec<Finding> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !is_comment(line) && OS_SHELL.is_match(line))
            .map(|(i, _)| {
                self.finding("Unsafe shell execution detected")
                    .with_file_path(Some(path))
                    .with_line(i + 1)
                    .with_suggestion("Use subprocess.run() with a list of arguments instead.")
            })
            .collect();

        if !ctx.rule_option_bool(self.id(), "allow_shell_true").unwrap_or(false) {
            findings.extend(SUBPROCESS_SHELL.captures_iter(content).map(|caps| {
                let call = caps.get(0).map_or(0, |m| m.start());
                self.finding(format!(
                    "Unsafe shell execution: subprocess.{}() with shell=True",
                    &caps[1]
                ))
                .with_file_path(Some(path))
                .with_line(line_at(content, call))
                .with_suggestion("Pass a list of arguments instead of a shell string.")
            }));
        }
        findings
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
