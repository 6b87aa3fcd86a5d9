//! Helpers shared by the rule packs.

use std::path::{Path, PathBuf};

use agentlint_core::EvaluationContext;
use regex::Regex;
use tracing::debug;

/// Tools that write file content.
pub(crate) const WRITE_TOOLS: &[&str] = &["Write", "Edit"];

/// Tools that run shell commands.
pub(crate) const BASH_TOOLS: &[&str] = &["Bash"];

/// Compile a built-in pattern. Built-in patterns are constants, so failure
/// is a programming error.
pub(crate) fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// 1-based line number of byte `offset` in `content`.
pub(crate) fn line_at(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Final path component of a `/`-separated path.
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Content the tool is about to write: `content` for Write, `new_string`
/// for Edit.
pub(crate) fn written_content(ctx: &EvaluationContext) -> Option<&str> {
    ctx.input_content().or_else(|| ctx.input_str("new_string"))
}

/// Non-empty shell command of a Bash tool call.
pub(crate) fn bash_command(ctx: &EvaluationContext) -> Option<&str> {
    if !ctx.is_tool(BASH_TOOLS) {
        return None;
    }
    ctx.command().filter(|c| !c.is_empty())
}

/// Resolve `path` against the project directory.
pub(crate) fn project_path(ctx: &EvaluationContext, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.project_dir.join(path)
    }
}

/// Read a changed file as lossy UTF-8. Missing or unreadable files yield
/// `None`.
pub(crate) fn read_changed_file(ctx: &EvaluationContext, path: &str) -> Option<String> {
    let full = project_path(ctx, path);
    match std::fs::read(&full) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(path = %full.display(), error = %e, "skipping unreadable changed file");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use agentlint_core::HookEvent;
    use serde_json::json;

    #[test]
    fn line_at_counts_preceding_newlines() {
        let content = "a\nbb\nccc";
        assert_eq!(line_at(content, 0), 1);
        assert_eq!(line_at(content, 2), 2);
        assert_eq!(line_at(content, content.len()), 3);
    }

    #[test]
    fn file_name_takes_last_component() {
        assert_eq!(file_name("a/b/.env"), ".env");
        assert_eq!(file_name("plain.py"), "plain.py");
    }

    #[test]
    fn written_content_prefers_content_then_new_string() {
        let write = EvaluationContext::new(HookEvent::PreToolUse, "Write", json!({"content": "x"}), ".");
        let edit = EvaluationContext::new(HookEvent::PreToolUse, "Edit", json!({"new_string": "y"}), ".");
        assert_eq!(written_content(&write), Some("x"));
        assert_eq!(written_content(&edit), Some("y"));
    }

    #[test]
    fn bash_command_requires_bash_and_text() {
        let bash = EvaluationContext::bash(HookEvent::PreToolUse, "ls");
        let empty = EvaluationContext::bash(HookEvent::PreToolUse, "");
        let write = EvaluationContext::new(HookEvent::PreToolUse, "Write", json!({"command": "ls"}), ".");
        assert_eq!(bash_command(&bash), Some("ls"));
        assert_eq!(bash_command(&empty), None);
        assert_eq!(bash_command(&write), None);
    }

    #[test]
    fn read_changed_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let ctx = EvaluationContext::new(HookEvent::Stop, "", serde_json::Value::Null, dir.path());
        assert_eq!(read_changed_file(&ctx, "a.txt").as_deref(), Some("hello"));
        assert_eq!(read_changed_file(&ctx, "missing.txt"), None);
    }
}
