//! Core value types: severities, lifecycle events, and findings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Severity of a finding.
///
/// Ordered `Info < Warning < Error`. Only `Error` blocks the agent action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; never shown as a problem.
    Info,
    /// Advisory; the action proceeds.
    Warning,
    /// Blocking; the action is denied.
    Error,
}

impl Severity {
    /// Whether a finding at this severity blocks the action.
    #[must_use]
    pub fn is_blocking(self) -> bool {
        self == Self::Error
    }

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(CoreError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Agent lifecycle event that triggers one evaluation.
///
/// Wire names match the agent hook protocol (`PreToolUse`, `Stop`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    /// Before a tool executes.
    PreToolUse,
    /// After a tool executed successfully.
    PostToolUse,
    /// After a tool execution failed.
    PostToolUseFailure,
    /// The agent is stopping (end of a working session).
    Stop,
    /// A session started.
    SessionStart,
    /// A session ended.
    SessionEnd,
    /// The user submitted a prompt.
    UserPromptSubmit,
    /// A subagent started.
    SubagentStart,
    /// A subagent stopped.
    SubagentStop,
    /// The agent emitted a notification.
    Notification,
    /// Before context compaction.
    PreCompact,
    /// The agent asked for a permission decision.
    PermissionRequest,
}

impl HookEvent {
    /// All supported events, in protocol order.
    #[must_use]
    pub fn all() -> &'static [HookEvent] {
        &[
            Self::PreToolUse,
            Self::PostToolUse,
            Self::PostToolUseFailure,
            Self::Stop,
            Self::SessionStart,
            Self::SessionEnd,
            Self::UserPromptSubmit,
            Self::SubagentStart,
            Self::SubagentStop,
            Self::Notification,
            Self::PreCompact,
            Self::PermissionRequest,
        ]
    }

    /// Protocol name of the event.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::PostToolUseFailure => "PostToolUseFailure",
            Self::Stop => "Stop",
            Self::SessionStart => "SessionStart",
            Self::SessionEnd => "SessionEnd",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::SubagentStart => "SubagentStart",
            Self::SubagentStop => "SubagentStop",
            Self::Notification => "Notification",
            Self::PreCompact => "PreCompact",
            Self::PermissionRequest => "PermissionRequest",
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| CoreError::UnknownEvent(s.to_string()))
    }
}

/// A single issue detected by a rule.
///
/// Created by a rule predicate. Within the engine only the `severity` field
/// (and, when the circuit breaker downgrades it, the `message`) changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// ID of the rule that produced this finding.
    pub rule_id: String,
    /// Human-readable description.
    pub message: String,
    /// Current severity.
    pub severity: Severity,
    /// File the finding refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// 1-based line number within `file_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// How to fix it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    /// Create a finding with no location or suggestion.
    pub fn new(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            message: message.into(),
            severity,
            file_path: None,
            line: None,
            suggestion: None,
        }
    }

    /// Attach a file path.
    #[must_use]
    pub fn with_file_path(mut self, file_path: Option<impl Into<String>>) -> Self {
        self.file_path = file_path.map(Into::into);
        self
    }

    /// Attach a line number.
    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Whether this finding blocks the action.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
