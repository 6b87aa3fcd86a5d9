//! Destructive shell commands.
//!
//! Most patterns warn. Commands that wipe a disk, the filesystem root, or
//! the home directory are reported at ERROR regardless of the rule's
//! declared severity.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState, Severity};
use regex::Regex;

use crate::util::{bash_command, file_name, re};

/// Directories that are routinely deleted and safe to `rm -rf`.
const SAFE_RM_TARGETS: &[&str] = &[
    "node_modules",
    "__pycache__",
    ".cache",
    "dist",
    "build",
    ".venv",
    ".pytest_cache",
];

const PROTECTED_BRANCHES: &[&str] = &["main", "master", "develop", "production", "release"];

static RM_RF: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\brm\s+-\S*r\S*f|\brm\s+-\S*f\S*r"));
static RM_ROOT: LazyLock<Regex> =
    LazyLock::new(|| re(r"\brm\s+-\S*r\S*f\s+/(?:\s|$)|\brm\s+-\S*f\S*r\s+/(?:\s|$)"));
static RM_HOME: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\brm\s+-\S*(?:rf|fr)\s+(?:~|\$HOME)(?:\s|/|$)"));
static RM_FLAGS: LazyLock<Regex> = LazyLock::new(|| re(r"\brm\s+-\S+\s+"));
static GIT_BRANCH_FORCE_DELETE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i:\bgit\s+branch)\s+-D\s+(\S+)"));

/// Patterns reported with a fixed message, in check order.
static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::warn(r"(?i)\bDROP\s+TABLE\b", "DROP TABLE", "Ensure you have a backup before dropping tables."),
        Pattern::warn(r"(?i)\bDROP\s+DATABASE\b", "DROP DATABASE", "Ensure you have a backup before dropping databases."),
        Pattern::warn(r"(?i)\bgit\s+reset\s+--hard\b", "git reset --hard", "Consider git stash instead of git reset --hard."),
        Pattern::warn(r"(?i)\bgit\s+clean\s+-fd\b", "git clean -fd", "Run git clean -n first to preview what will be removed."),
        Pattern {
            regex: re(r"(?i)\bchmod\s+(?:-R\s+)?777\b"),
            message: "Overly permissive command detected: chmod 777".to_string(),
            suggestion: "Use more restrictive permissions (e.g. 755 for directories, 644 for files).",
            severity: None,
        },
        Pattern::catastrophic(r"(?i)\bmkfs\b", "mkfs (filesystem format)", "mkfs destroys all data on the target device."),
        Pattern::catastrophic(r"(?i)\bdd\b.*\bif=/dev/zero\b", "dd if=/dev/zero (disk wipe)", "dd if=/dev/zero overwrites data irreversibly."),
        Pattern {
            regex: re(r":\(\)\s*\{\s*:\|:\s*&\s*\}\s*;|\./:0\b"),
            message: "Fork bomb detected".to_string(),
            suggestion: "This command exhausts system resources.",
            severity: Some(Severity::Error),
        },
        Pattern::warn(
            r"(?i)\bdocker\s+system\s+prune\b.*-a\b.*--volumes\b",
            "docker system prune -a --volumes",
            "This removes all unused containers, images, networks, and volumes.",
        ),
        Pattern::warn(
            r"(?i)\bkubectl\s+delete\s+namespace\b",
            "kubectl delete namespace",
            "Verify you are not targeting a production namespace.",
        ),
    ]
});

struct Pattern {
    regex: Regex,
    message: String,
    suggestion: &'static str,
    /// `None` uses the rule's declared severity.
    severity: Option<Severity>,
}

impl Pattern {
    fn warn(pattern: &str, what: &'static str, suggestion: &'static str) -> Self {
        Self {
            regex: re(pattern),
            message: format!("Destructive command detected: {what}"),
            suggestion,
            severity: None,
        }
    }

    fn catastrophic(pattern: &str, what: &'static str, suggestion: &'static str) -> Self {
        Self {
            regex: re(pattern),
            message: format!("Catastrophic command detected: {what}"),
            suggestion,
            severity: Some(Severity::Error),
        }
    }
}

/// Whether every `rm -rf` target in `command` is a known throwaway directory.
fn rm_targets_safe(command: &str) -> bool {
    let Some(last) = RM_FLAGS.split(command).skip(1).last() else {
        return false;
    };
    let targets = last.split([';', '&', '|']).next().unwrap_or_default();
    let mut targets = targets.split_whitespace().peekable();
    if targets.peek().is_none() {
        return false;
    }
    targets.all(|t| {
        let t = t.trim_matches(['\'', '"']).trim_end_matches('/');
        SAFE_RM_TARGETS.contains(&file_name(t))
    })
}

/// Warns on (and for the worst cases blocks) destructive commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDestructiveCommands;

impl Rule for NoDestructiveCommands {
    rule_metadata! {
        id: "no-destructive-commands",
        description: "Warns on destructive commands like rm -rf, DROP TABLE, git reset --hard",
        severity: Warning,
        events: [PreToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some(command) = bash_command(ctx) else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        if RM_RF.is_match(command) {
            if RM_ROOT.is_match(command) || RM_HOME.is_match(command) {
                let mut finding = self.finding(
                    "Catastrophic command detected: rm -rf on root or home directory",
                );
                finding.severity = Severity::Error;
                findings.push(finding.with_suggestion(
                    "This would destroy critical system or user files. Never run rm -rf on / or ~.",
                ));
            } else if !rm_targets_safe(command) {
                findings.push(
                    self.finding("Destructive command detected: rm -rf")
                        .with_suggestion("Double-check the target path before running rm -rf."),
                );
            }
        }

        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(command) {
                let mut finding = self.finding(pattern.message.as_str());
                if let Some(severity) = pattern.severity {
                    finding.severity = severity;
                }
                findings.push(finding.with_suggestion(pattern.suggestion));
            }
        }

        if let Some(caps) = GIT_BRANCH_FORCE_DELETE.captures(command) {
            let branch = &caps[1];
            if PROTECTED_BRANCHES.contains(&branch.to_ascii_lowercase().as_str()) {
                let mut finding =
                    self.finding(format!("Destructive command detected: git branch -D {branch}"));
                finding.severity = Severity::Error;
                findings.push(finding.with_suggestion(format!(
                    "Deleting the '{branch}' branch is dangerous. Work on a feature branch instead."
                )));
            }
        }

        findings
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
