//! Ad-hoc dependency installs.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;

use crate::util::{bash_command, re};

static PIP_INSTALL: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bpip3?\s+install\b"));
static PIP_EDITABLE_LOCAL: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bpip3?\s+install\s+-e\s+\."));
static PIP_REQUIREMENTS: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bpip3?\s+install\s+-r\s+"));
// Bare `npm install` and flags-only installs restore the lockfile.
static NPM_INSTALL_PACKAGE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bnpm\s+install\s+[a-zA-Z@]"));

/// Suggests lockfile-based tooling over `pip install <pkg>` and
/// `npm install <pkg>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyHygiene;

impl Rule for DependencyHygiene {
    rule_metadata! {
        id: "dependency-hygiene",
        description: "Suggests using lockfile-based tools instead of ad-hoc pip/npm install",
        severity: Warning,
        events: [PreToolUse],
        pack: "universal",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some(command) = bash_command(ctx) else {
            return Vec::new();
        };
        let mut findings = Vec::new();

        if PIP_INSTALL.is_match(command)
            && !PIP_EDITABLE_LOCAL.is_match(command)
            && !PIP_REQUIREMENTS.is_match(command)
        {
            findings.push(
                self.finding("Ad-hoc pip install detected")
                    .with_suggestion("Use poetry/uv add to keep dependencies in a lockfile."),
            );
        }
        if NPM_INSTALL_PACKAGE.is_match(command) {
            findings.push(
                self.finding("Ad-hoc npm install <package> detected")
                    .with_suggestion("Use npm ci for reproducible installs."),
            );
        }
        findings
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
