//! Evaluation context passed to every rule.
//!
//! A snapshot of one agent action: which lifecycle event fired, which tool
//! ran with which input, and any file content the caller loaded. The context
//! is immutable during evaluation; mutable per-session data lives in
//! [`SessionState`](crate::session::SessionState), passed alongside it.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::rule_config::RuleSettings;
use crate::types::HookEvent;

/// Snapshot of the action being evaluated.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// Lifecycle event that triggered this evaluation.
    pub event: HookEvent,
    /// Tool being invoked (e.g. `Bash`, `Write`, `Edit`). Empty for
    /// events without a tool.
    pub tool_name: String,
    /// Tool input as a JSON object.
    pub tool_input: Value,
    /// Project root directory.
    pub project_dir: PathBuf,
    /// File content relevant to the action (new content on `PreToolUse`,
    /// on-disk content on `PostToolUse`).
    pub file_content: Option<String>,
    /// File content before the action, when known.
    pub file_content_before: Option<String>,
    /// Per-rule settings keyed by rule ID.
    pub rule_config: HashMap<String, RuleSettings>,
    /// Submitted prompt (`UserPromptSubmit`).
    pub prompt: Option<String>,
    /// Subagent output (`SubagentStop`).
    pub subagent_output: Option<String>,
    /// Notification kind (`Notification`).
    pub notification_type: Option<String>,
    /// Compaction trigger, `manual` or `auto` (`PreCompact`).
    pub compact_source: Option<String>,
}

impl EvaluationContext {
    /// Create a context for a tool call with no file content.
    pub fn new(
        event: HookEvent,
        tool_name: impl Into<String>,
        tool_input: Value,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            event,
            tool_name: tool_name.into(),
            tool_input,
            project_dir: project_dir.into(),
            file_content: None,
            file_content_before: None,
            rule_config: HashMap::new(),
            prompt: None,
            subagent_output: None,
            notification_type: None,
            compact_source: None,
        }
    }

    /// Context for a `Bash` tool call.
    pub fn bash(event: HookEvent, command: &str) -> Self {
        Self::new(event, "Bash", serde_json::json!({ "command": command }), ".")
    }

    /// Set the per-rule settings.
    #[must_use]
    pub fn with_rule_config(mut self, rule_config: HashMap<String, RuleSettings>) -> Self {
        self.rule_config = rule_config;
        self
    }

    /// Set the file content.
    #[must_use]
    pub fn with_file_content(mut self, content: impl Into<String>) -> Self {
        self.file_content = Some(content.into());
        self
    }

    /// Set the pre-action file content.
    #[must_use]
    pub fn with_file_content_before(mut self, content: Option<String>) -> Self {
        self.file_content_before = content;
        self
    }

    /// `tool_input.file_path`, if present and a string.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        self.input_str("file_path")
    }

    /// `tool_input.command`, if present and a string.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.input_str("command")
    }

    /// `tool_input.content`, if present and a string.
    #[must_use]
    pub fn input_content(&self) -> Option<&str> {
        self.input_str("content")
    }

    /// String field of the tool input.
    #[must_use]
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input.get(key).and_then(Value::as_str)
    }

    /// Whether the tool is one of `names`.
    #[must_use]
    pub fn is_tool(&self, names: &[&str]) -> bool {
        names.contains(&self.tool_name.as_str())
    }

    /// Settings for `rule_id`, if configured.
    #[must_use]
    pub fn rule_settings(&self, rule_id: &str) -> Option<&RuleSettings> {
        self.rule_config.get(rule_id)
    }

    /// Unsigned integer option for `rule_id`.
    #[must_use]
    pub fn rule_option_u64(&self, rule_id: &str, key: &str) -> Option<u64> {
        self.rule_settings(rule_id)?.option_u64(key)
    }

    /// Boolean option for `rule_id`.
    #[must_use]
    pub fn rule_option_bool(&self, rule_id: &str, key: &str) -> Option<bool> {
        self.rule_settings(rule_id)?.option_bool(key)
    }

    /// List-of-strings option for `rule_id`.
    #[must_use]
    pub fn rule_option_str_list(&self, rule_id: &str, key: &str) -> Option<Vec<String>> {
        self.rule_settings(rule_id)?.option_str_list(key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
