//! Risky Alembic migration operations.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use regex::Regex;

use super::python_write;
use crate::util::{line_at, re};

/// Path fragments that mark a migration file unless `migration_paths` is set.
const DEFAULT_MIGRATION_MARKERS: &[&str] = &["migration", "alembic", "versions"];

static DROP_TABLE: LazyLock<Regex> = LazyLock::new(|| re(r"\bop\.drop_table\s*\("));
static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| re(r"\bop\.create_table\s*\("));
static DROP_COLUMN: LazyLock<Regex> = LazyLock::new(|| re(r"\bop\.drop_column\s*\("));
static ALTER_NOT_NULL: LazyLock<Regex> =
    LazyLock::new(|| re(r"\bop\.alter_column\s*\([^)]*nullable\s*=\s*False"));
static DATETIME: LazyLock<Regex> = LazyLock::new(|| re(r"\bsa\.DateTime\b"));
static TIMEZONE_TRUE: LazyLock<Regex> = LazyLock::new(|| re(r"timezone\s*=\s*True"));

fn is_migration_file(path: &str, markers: &[String]) -> bool {
    let lower = path.to_lowercase();
    if markers.is_empty() {
        DEFAULT_MIGRATION_MARKERS.iter().any(|m| lower.contains(m))
    } else {
        markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

/// Whether the `sa.DateTime` ending at `end` sets `timezone=True` before
/// its argument list closes.
fn has_timezone(content: &str, end: usize) -> bool {
    let rest = &content[end..];
    let args = rest.find(')').map_or(rest, |close| &rest[..close]);
    TIMEZONE_TRUE.is_match(args)
}

/// Warns on migration operations that lose data or fail on live tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDangerousMigration;

impl Rule for NoDangerousMigration {
    rule_metadata! {
        id: "no-dangerous-migration",
        description: "Warns about dangerous database migration operations",
        severity: Warning,
        events: [PreToolUse],
        pack: "python",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some((path, content)) = python_write(ctx) else {
            return Vec::new();
        };
        let markers = ctx
            .rule_option_str_list(self.id(), "migration_paths")
            .unwrap_or_default();
        if !is_migration_file(path, &markers) {
            return Vec::new();
        }

        let at = |offset: usize, message: &str, suggestion: &str| {
            self.finding(message)
                .with_file_path(Some(path))
                .with_line(line_at(content, offset))
                .with_suggestion(suggestion)
        };
        let mut findings = Vec::new();

        // Dropping is only reversible when the same file can recreate the table.
        if !CREATE_TABLE.is_match(content) {
            findings.extend(DROP_TABLE.find_iter(content).map(|m| {
                at(
                    m.start(),
                    "op.drop_table() without corresponding op.create_table()",
                    "Add a create_table in the downgrade() to make migration reversible.",
                )
            }));
        }
        findings.extend(DROP_COLUMN.find_iter(content).map(|m| {
            at(
                m.start(),
                "op.drop_column() is a destructive, hard-to-reverse operation",
                "Consider a two-step migration: deprecate then drop.",
            )
        }));
        findings.extend(ALTER_NOT_NULL.find_iter(content).map(|m| {
            at(
                m.start(),
                "op.alter_column() with nullable=False may fail on existing NULLs",
                "Add a data migration to fill NULLs before setting nullable=False.",
            )
        }));
        if ctx.rule_option_bool(self.id(), "require_timezone").unwrap_or(true) {
            findings.extend(
                DATETIME
                    .find_iter(content)
                    .filter(|m| !has_timezone(content, m.end()))
                    .map(|m| {
                        at(
                            m.start(),
                            "sa.DateTime without timezone=True",
                            "Use sa.DateTime(timezone=True) to store timezone-aware datetimes.",
                        )
                    }),
            );
        }
        findings
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
