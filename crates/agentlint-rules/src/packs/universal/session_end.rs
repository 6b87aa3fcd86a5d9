//! End-of-session checks over the files changed during the session.

use std::path::Path;
use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;

use crate::util::{file_name, re, read_changed_file};

static TODO_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?:#|//|/\*)\s*(?:TODO|FIXME|HACK|XXX)\b"));
static CONSOLE_LOG: LazyLock<Regex> = LazyLock::new(|| re(r"\bconsole\.log\("));
static DEBUGGER: LazyLock<Regex> = LazyLock::new(|| re(r"\bdebugger\b"));
static PRINT: LazyLock<Regex> = LazyLock::new(|| re(r"\bprint\("));
static PDB: LazyLock<Regex> = LazyLock::new(|| re(r"\bpdb\.set_trace\(\)"));
static BREAKPOINT: LazyLock<Regex> = LazyLock::new(|| re(r"\bbreakpoint\(\)"));

const JS_EXTENSIONS: &[&str] = &["js", "ts", "tsx"];
const SOURCE_EXTENSIONS: &[&str] = &["py", "ts", "tsx", "js", "jsx"];
/// File stems that are configuration or generated code rather than logic.
const NOT_SOURCE_STEMS: &[&str] = &["migration", "alembic", "config", "settings", "conftest"];
/// Python entry points where `print()` is the intended output.
const PRINT_ALLOWED: &[&str] = &["cli.py", "__main__.py", "manage.py", "setup.py"];

/// Reports leftover TODO/FIXME/HACK/XXX comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTodoLeft;

impl Rule for NoTodoLeft {
    rule_metadata! {
        id: "no-todo-left",
        description: "Detects leftover TODO/FIXME/HACK/XXX comments in changed files",
        severity: Info,
        events: [Stop],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, session: &mut SessionState) -> Vec<Finding> {
        session
            .changed_files()
            .into_iter()
            .filter_map(|path| {
                let content = read_changed_file(ctx, &path)?;
                let count = TODO_COMMENT.find_iter(&content).count();
                (count > 0).then(|| {
                    self.finding(format!("Found {count} TODO/FIXME comment(s) in {path}"))
                        .with_file_path(Some(path.as_str()))
                        .with_suggestion("Review and resolve TODO comments before finalizing.")
                })
            })
            .collect()
    }
}

fn is_test_file(path: &str) -> bool {
    file_name(path).to_lowercase().contains("test")
        || path
            .split('/')
            .any(|part| matches!(part.to_lowercase().as_str(), "tests" | "test" | "__tests__"))
}

fn is_source_file(path: &str) -> bool {
    let path = Path::new(path);
    let is_source = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();
    is_source && !NOT_SOURCE_STEMS.iter().any(|skip| stem.contains(skip))
}

/// Warns when source files changed but no test file did.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestWithChanges;

impl Rule for TestWithChanges {
    rule_metadata! {
        id: "test-with-changes",
        description: "Warns when source files are changed but no test files were updated",
        severity: Warning,
        events: [Stop],
        pack: "universal",
    }

    fn evaluate(&self, _ctx: &EvaluationContext, session: &mut SessionState) -> Vec<Finding> {
        let files = session.changed_files();
        if files.iter().any(|f| is_test_file(f)) {
            return Vec::new();
        }
        let sources = files.iter().filter(|f| is_source_file(f)).count();
        if sources == 0 {
            return Vec::new();
        }
        vec![
            self.finding(format!(
                "Changed {sources} source file(s) but no test files were updated"
            ))
            .with_suggestion("Consider adding or updating tests for the changed source files."),
        ]
    }
}

fn debug_artifacts(path: &str, content: &str) -> Vec<&'static str> {
    let extension = Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or_default();
    let mut found = Vec::new();
    if JS_EXTENSIONS.contains(&extension) {
        if CONSOLE_LOG.is_match(content) {
            found.push("console.log()");
        }
        if DEBUGGER.is_match(content) {
            found.push("debugger");
        }
    } else if extension == "py" {
        let print_allowed = PRINT_ALLOWED.contains(&file_name(path).to_lowercase().as_str())
            || content.contains("if __name__");
        if PRINT.is_match(content) && !print_allowed {
            found.push("print()");
        }
        if PDB.is_match(content) {
            found.push("pdb.set_trace()");
        }
        if BREAKPOINT.is_match(content) {
            found.push("breakpoint()");
        }
    }
    found
}

/// Reports debugging statements left in non-test files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDebugArtifacts;

impl Rule for NoDebugArtifacts {
    rule_metadata! {
        id: "no-debug-artifacts",
        description: "Detects leftover debug statements (console.log, print, debugger, breakpoint)",
        severity: Warning,
        events: [Stop],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, session: &mut SessionState) -> Vec<Finding> {
        session
            .changed_files()
            .into_iter()
            .filter(|path| !is_test_file(path))
            .filter_map(|path| {
                let content = read_changed_file(ctx, &path)?;
                let artifacts = debug_artifacts(&path, &content);
                (!artifacts.is_empty()).then(|| {
                    self.finding(format!("Debug artifacts in {path}: {}", artifacts.join(", ")))
                        .with_file_path(Some(path.as_str()))
                        .with_suggestion("Remove debug statements before finalizing.")
                })
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
