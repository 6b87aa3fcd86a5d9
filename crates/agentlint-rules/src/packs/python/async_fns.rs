//! `async def` functions that never await.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;

use super::indent;
use crate::util::{WRITE_TOOLS, file_name, line_at, re, written_content};

static ASYNC_DEF: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?m)^([ \t]*)async\s+def\s+(\w+)\s*\("));
static AWAITS: LazyLock<Regex> = LazyLock::new(|| re(r"\bawait\b|\basync\s+(?:for|with)\b"));

/// Decorators whose functions must stay `async` regardless of their body.
const SKIP_DECORATORS: &[&str] = &["property", "override", "abstractmethod"];
/// Stub bodies.
const SKIP_BODIES: &[&str] = &["pass", "...", "raise NotImplementedError"];

fn is_test_file(path: &str) -> bool {
    let name = file_name(path).to_lowercase();
    name.starts_with("test_") || name.starts_with("conftest") || path.to_lowercase().contains("/test")
}

/// Name of the decorator on `line` without module path or arguments.
fn decorator_name(line: &str) -> Option<&str> {
    let call = line.strip_prefix('@')?;
    let name = call.split('(').next().unwrap_or(call);
    name.rsplit('.').next()
}

/// Whether the `def` at `lines[def_line]` carries one of `skip`.
fn has_skipped_decorator(lines: &[&str], def_line: usize, skip: &[String]) -> bool {
    for line in lines[..def_line].iter().rev().map(|l| l.trim()) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match decorator_name(line) {
            Some(name) if SKIP_DECORATORS.contains(&name) || skip.iter().any(|s| s == name) => {
                return true;
            }
            Some(_) => {}
            None => return false,
        }
    }
    false
}

/// Lines indented deeper than `base` that follow `def_line`, blank lines
/// included.
fn body<'a>(lines: &[&'a str], def_line: usize, base: usize) -> Vec<&'a str> {
    lines[def_line + 1..]
        .iter()
        .take_while(|line| line.trim().is_empty() || indent(line) > base)
        .copied()
        .collect()
}

/// Flags `async def` functions with no `await` in their body. Stubs and
/// functions under `ignore_decorators` are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnnecessaryAsync;

impl Rule for NoUnnecessaryAsync {
    rule_metadata! {
        id: "no-unnecessary-async",
        description: "Flags async functions that don't use await",
        severity: Info,
        events: [PostToolUse],
        pack: "python",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        if !ctx.is_tool(WRITE_TOOLS) {
            return Vec::new();
        }
        let Some(path) = ctx
            .file_path()
            .filter(|p| p.ends_with(".py") && !is_test_file(p))
        else {
            return Vec::new();
        };
        // The whole file after the write when the caller loaded it.
        let Some(content) = ctx
            .file_content
            .as_deref()
            .or_else(|| written_content(ctx))
            .filter(|c| !c.is_empty())
        else {
            return Vec::new();
        };
        let ignore = ctx
            .rule_option_str_list(self.id(), "ignore_decorators")
            .unwrap_or_default();
        let lines: Vec<&str> = content.lines().collect();

        ASYNC_DEF
            .captures_iter(content)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let base = caps[1].len();
                let name = &caps[2];
                let def_line = line_at(content, start) - 1;
                if has_skipped_decorator(&lines, def_line, &ignore) {
                    return None;
                }
                let text = body(&lines, def_line, base).join("\n");
                if SKIP_BODIES.contains(&text.trim()) || AWAITS.is_match(&text) {
                    return None;
                }
                Some(
                    self.finding(format!("async def {name}() has no await expression"))
                        .with_file_path(Some(path))
                        .with_line(def_line + 1)
                        .with_suggestion(format!(
                            "Remove async from {name}() or add await expressions."
                        )),
                )
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
