//! The `python` pack: line-based checks on Python source being written.

mod async_fns;
mod injection;
mod migration;

pub use async_fns::NoUnnecessaryAsync;
pub use injection::{NoSqlInjection, NoUnsafeShell};
pub use migration::NoDangerousMigration;

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;

use crate::util::{WRITE_TOOLS, file_name, re, written_content};

static BARE_EXCEPT: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*except\s*:"));
static WILDCARD_IMPORT: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*from\s+\S+\s+import\s+\*"));

/// Path and content of a Python file being written, if that is what `ctx` is.
fn python_write(ctx: &EvaluationContext) -> Option<(&str, &str)> {
    if !ctx.is_tool(WRITE_TOOLS) {
        return None;
    }
    let path = ctx.file_path().filter(|p| p.ends_with(".py"))?;
    let content = written_content(ctx).filter(|c| !c.is_empty())?;
    Some((path, content))
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Whether the block opened at `lines[0]` contains a bare `raise` before
/// the indentation drops back.
fn block_reraises(lines: &[&str]) -> bool {
    let Some((head, body)) = lines.split_first() else {
        return false;
    };
    let base = indent(head);
    for line in body {
        let stripped = line.trim_start();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        if indent(line) <= base {
            return false;
        }
        if stripped == "raise" || stripped.starts_with("raise ") {
            return true;
        }
    }
    false
}

/// Flags `except:` clauses, which also catch `SystemExit` and
/// `KeyboardInterrupt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBareExcept;

impl Rule for NoBareExcept {
    rule_metadata! {
        id: "no-bare-except",
        description: "Prevents bare except: clauses that catch all exceptions",
        severity: Warning,
        events: [PreToolUse],
        pack: "python",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = python_write(ctx) else {
            return Vec::new();
        };
        let allow_reraise = ctx.rule_option_bool(self.id(), "allow_reraise").unwrap_or(true);
        let lines: Vec<&str> = content.lines().collect();

        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| BARE_EXCEPT.is_match(line))
            .filter(|(i, _)| !(allow_reraise && block_reraises(&lines[*i..])))
            .map(|(i, _)| {
                self.finding("Bare except: catches SystemExit and KeyboardInterrupt")
                    .with_file_path(Some(path))
                    .with_line(i + 1)
                    .with_suggestion("Use 'except Exception:' instead of bare 'except:'.")
            })
            .collect()
    }
}

/// Flags `from module import *` outside the files listed in `allow_in`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWildcardImport;

impl Rule for NoWildcardImport {
    rule_metadata! {
        id: "no-wildcard-import",
        description: "Prevents wildcard imports that pollute the namespace",
        severity: Warning,
        events: [PreToolUse],
        pack: "python",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = python_write(ctx) else {
            return Vec::new();
        };
        let allow_in = ctx
            .rule_option_str_list(self.id(), "allow_in")
            .unwrap_or_else(|| vec!["__init__.py".to_string()]);
        if allow_in.iter().any(|name| name == file_name(path)) {
            return Vec::new();
        }

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| WILDCARD_IMPORT.is_match(line))
            .map(|(i, _)| {
                self.finding("Wildcard import (from ... import *) pollutes namespace")
                    .with_file_path(Some(path))
                    .with_line(i + 1)
                    .with_suggestion("Import specific names instead of using import *.")
            })
            .collect()
    }
}

/// Rules of the pack in evaluation order.
pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(NoSqlInjection),
        Box::new(NoBareExcept),
        Box::new(NoUnsafeShell),
        Box::new(NoDangerousMigration),
        Box::new(NoWildcardImport),
        Box::new(NoUnnecessaryAsync),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
