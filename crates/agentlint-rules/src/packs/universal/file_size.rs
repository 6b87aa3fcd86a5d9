//! File length limit.

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};

use crate::util::WRITE_TOOLS;

const DEFAULT_LIMIT: u64 = 500;

/// Lines in `content`; a trailing line without a newline counts.
fn line_count(content: &str) -> u64 {
    let newlines = content.bytes().filter(|&b| b == b'\n').count() as u64;
    if content.is_empty() || content.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Warns when a written file exceeds the `limit` option (default 500 lines).
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxFileSize;

impl Rule for MaxFileSize {
    rule_metadata! {
        id: "max-file-size",
        description: "Warns when a file exceeds a configurable line-count limit after Write/Edit",
        severity: Warning,
        events: [PostToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        if !ctx.is_tool(WRITE_TOOLS) {
            return Vec::new();
        }
        let Some(content) = ctx.file_content.as_deref() else {
            return Vec::new();
        };
        let limit = ctx.rule_option_u64(self.id(), "limit").unwrap_or(DEFAULT_LIMIT);
        let lines = line_count(content);
        if lines <= limit {
            return Vec::new();
        }

        let path = ctx.file_path().unwrap_or_default();
        vec![
            self.finding(format!("File {path} has {lines} lines (limit: {limit})"))
                .with_file_path(ctx.file_path())
                .with_suggestion(format!(
                    "Consider splitting the file into smaller modules (limit is {limit} lines)."
                )),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
