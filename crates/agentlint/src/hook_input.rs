//! Hook payload parsing and evaluation-context assembly.
//!
//! The agent runtime pipes one JSON object per hook invocation on stdin.
//! Everything in it is optional; an unreadable payload is treated as `{}`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use agentlint_core::{EvaluationContext, HookEvent, RuleSettings, SessionState};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Session key caching pre-edit file content by path.
pub const FILE_CACHE_KEY: &str = "file_cache";

const FILE_TOOLS: &[&str] = &["Write", "Edit"];

/// Fields of the hook payload the rules use.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HookInput {
    /// Tool being invoked.
    pub tool_name: String,
    /// Tool input object.
    pub tool_input: Value,
    /// Submitted prompt (`UserPromptSubmit`).
    pub prompt: Option<String>,
    /// Subagent output (`SubagentStop`).
    pub subagent_output: Option<String>,
    /// Notification kind (`Notification`).
    pub notification_type: Option<String>,
    /// Compaction trigger (`PreCompact`).
    pub compact_source: Option<String>,
}

impl HookInput {
    /// Parse a raw payload. Blank or malformed input yields the default.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        let mut input: Self = serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!(error = %e, "unreadable hook payload, treating as empty");
            Self::default()
        });
        if !input.tool_input.is_object() {
            input.tool_input = Value::Object(serde_json::Map::new());
        }
        input
    }
}

/// Build the context for `event`, loading file content from disk where the
/// event calls for it.
///
/// On `PreToolUse` for `Write`/`Edit` the current on-disk content is cached
/// in the session; on `PostToolUse` it is popped back out as
/// `file_content_before` and the written file is read.
pub fn build_context(
    event: HookEvent,
    input: HookInput,
    project_dir: &Path,
    rule_config: HashMap<String, RuleSettings>,
    session: &mut SessionState,
) -> EvaluationContext {
    let mut ctx = EvaluationContext::new(event, input.tool_name, input.tool_input, project_dir)
        .with_rule_config(rule_config);
    ctx.prompt = input.prompt;
    ctx.subagent_output = input.subagent_output;
    ctx.notification_type = input.notification_type;
    ctx.compact_source = input.compact_source;

    let Some(file_path) = ctx.file_path().map(str::to_string) else {
        return ctx;
    };

    match event {
        HookEvent::PreToolUse if ctx.is_tool(FILE_TOOLS) => {
            let before = read_project_file(project_dir, &file_path);
            if let Some(before) = &before {
                let _ = session
                    .namespace_mut(FILE_CACHE_KEY)
                    .insert(file_path.clone(), Value::String(before.clone()));
            }
            if let Some(content) = ctx.input_content().filter(|c| !c.is_empty()).map(str::to_string) {
                ctx = ctx.with_file_content(content).with_file_content_before(before);
            }
        }
        HookEvent::PostToolUse => {
            let before = session
                .namespace_mut(FILE_CACHE_KEY)
                .remove(&file_path)
                .and_then(|v| v.as_str().map(str::to_string));
            if let Some(content) = read_project_file(project_dir, &file_path) {
                ctx = ctx.with_file_content(content).with_file_content_before(before);
            }
        }
        _ => {}
    }
    ctx
}

/// Resolve `file_path` against `project_dir`, refusing anything that lands
/// outside the project once symlinks are resolved.
pub fn resolve_in_project(project_dir: &Path, file_path: &str) -> Option<PathBuf> {
    let root = project_dir.canonicalize().ok()?;
    let resolved = root.join(file_path).canonicalize().ok()?;
    if resolved.starts_with(&root) {
        Some(resolved)
    } else {
        warn!(file_path, "path outside project blocked");
        None
    }
}

fn read_project_file(project_dir: &Path, file_path: &str) -> Option<String> {
    let path = resolve_in_project(project_dir, file_path)?;
    match std::fs::read(&path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not read file");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
