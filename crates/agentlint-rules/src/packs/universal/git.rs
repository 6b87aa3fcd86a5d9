//! Git safety: force pushes, direct pushes to protected branches, skipped
//! hooks.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;

use crate::util::{bash_command, re};

static GIT_PUSH: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bgit\s+push\b"));
static FORCE_FLAG: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)--force|-f\b"));
static MAIN_BRANCH: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(main|master)\b"));
static NO_VERIFY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bgit\s+commit\b.*--no-verify\b"));
static NO_GPG_SIGN: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bgit\s+commit\b.*--no-gpg-sign\b"));

/// A `git push` found in a command.
struct Push<'a> {
    force: bool,
    branch: Option<&'a str>,
}

/// Every `git push` in `command`. Flags and branch names are read from the
/// rest of the push's own shell segment, which ends at a newline, `;`, `&`
/// or `|`.
fn pushes(command: &str) -> impl Iterator<Item = Push<'_>> {
    GIT_PUSH.find_iter(command).map(|push| {
        let rest = &command[push.end()..];
        let segment = rest
            .find(['\n', ';', '&', '|'])
            .map_or(rest, |end| &rest[..end]);
        Push {
            force: FORCE_FLAG.is_match(segment),
            branch: MAIN_BRANCH
                .captures(segment)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str()),
        }
    })
}

/// First push with the given force-ness that names a protected branch.
fn protected_push(command: &str, force: bool) -> Option<&str> {
    pushes(command)
        .filter(|p| p.force == force)
        .find_map(|p| p.branch)
}

/// Blocks force pushes naming `main` or `master`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForcePush;

impl Rule for NoForcePush {
    rule_metadata! {
        id: "no-force-push",
        description: "Prevents force-pushing to main or master branches",
        severity: Error,
        events: [PreToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some(branch) = bash_command(ctx).and_then(|c| protected_push(c, true)) else {
            return Vec::new();
        };
        vec![
            self.finding(format!("Force push to '{branch}' is blocked"))
                .with_suggestion(format!(
                    "Never force-push to {branch}. Push to a feature branch instead."
                )),
        ]
    }
}

/// Warns on non-force pushes naming `main` or `master`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPushToMain;

impl Rule for NoPushToMain {
    rule_metadata! {
        id: "no-push-to-main",
        description: "Warns on direct push to main or master branches",
        severity: Warning,
        events: [PreToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some(branch) = bash_command(ctx).and_then(|c| protected_push(c, false)) else {
            return Vec::new();
        };
        vec![
            self.finding(format!("Direct push to '{branch}' detected"))
                .with_suggestion(format!(
                    "Push to a feature branch and open a pull request instead of pushing directly to {branch}."
                )),
        ]
    }
}

/// Warns on commits that bypass hooks or signing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSkipHooks;

impl Rule for NoSkipHooks {
    rule_metadata! {
        id: "no-skip-hooks",
        description: "Warns on git commit --no-verify or --no-gpg-sign",
        severity: Warning,
        events: [PreToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some(command) = bash_command(ctx) else {
            return Vec::new();
        };
        let mut findings = Vec::new();
        if NO_VERIFY.is_match(command) {
            findings.push(
                self.finding("git commit --no-verify skips pre-commit hooks")
                    .with_suggestion("Fix the hook failures instead of bypassing them."),
            );
        }
        if NO_GPG_SIGN.is_match(command) {
            findings.push(
                self.finding("git commit --no-gpg-sign skips commit signing")
                    .with_suggestion("Remove --no-gpg-sign if the project requires signed commits."),
            );
        }
        findings
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
