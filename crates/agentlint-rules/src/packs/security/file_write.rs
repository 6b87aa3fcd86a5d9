//! File writes that go through the shell instead of the Write/Edit tools,
//! where the content checks never see them.

use std::sync::LazyLock;

use agentlint_core::{EvaluationContext, Finding, Rule, SessionState};
use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use tracing::warn;

use crate::util::{bash_command, re};

/// Write shapes with the label reported for each, in check order.
static WRITE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (re(r"\b(?:cat|echo|printf)\b.*>{1,2}\s*\S+"), "redirect (>/>>)"),
        (re(r"\btee\s+(?:-a\s+)?\S+"), "tee"),
        (re(r"\bsed\s+(?:.*\s)?-i\s"), "sed -i"),
        (re(r"\bcp\s+\S+\s+\S+"), "cp"),
        (re(r"\bmv\s+\S+\s+\S+"), "mv"),
        (re(r"\bperl\s+.*-[a-zA-Z]*p[a-zA-Z]*i"), "perl -pi -e"),
        (re(r"\bawk\b.*>\s*\S+"), "awk >"),
        (re(r"\bdd\b.*\bof=\S+"), "dd of="),
        (
            re(r"\bpython[23]?\s+-c\s+.*(?:open\s*\(|\.write\s*\(|Path\s*\()"),
            "python -c write",
        ),
        (re(r#"\bcat\b.*<<\s*['"\\]?\w+"#), "heredoc"),
    ]
});

/// `$(cat <<'EOF' ...)` passes a multi-line argument, e.g. a commit message.
static HEREDOC_SUBSTITUTION: LazyLock<Regex> = LazyLock::new(|| re(r"\$\(\s*cat\s+<<"));

static TARGETS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r">{1,2}\s*(\S+)"),
        re(r"\btee\s+(?:-a\s+)?(\S+)"),
        re(r"\bcp\s+\S+\s+(\S+)"),
        re(r"\bmv\s+\S+\s+(\S+)"),
        re(r"\bdd\b.*\bof=(\S+)"),
    ]
});

/// Redirect targets that are not files.
fn is_stream(target: &str) -> bool {
    target.starts_with('&') || matches!(target, "/dev/null" | "/dev/stdout" | "/dev/stderr")
}

/// Paths written by `command`, quotes stripped, in pattern order.
fn target_paths(command: &str) -> Vec<&str> {
    TARGETS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(command))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|path| !path.is_empty())
        .collect()
}

fn compile_globs(patterns: &[String]) -> Vec<GlobMatcher> {
    patterns
        .iter()
        .filter_map(|p| match GlobBuilder::new(p).literal_separator(false).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                warn!(pattern = %p, error = %e, "ignoring invalid allow_paths glob");
                None
            }
        })
        .collect()
}

fn compile_regexes(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!(pattern = %p, error = %e, "ignoring invalid allow_patterns regex");
                None
            }
        })
        .collect()
}

/// Blocks shell commands that write files. Whole commands can be allowed
/// with `allow_patterns` (regexes) and targets with `allow_paths` (globs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBashFileWrite;

impl Rule for NoBashFileWrite {
    rule_metadata! {
        id: "no-bash-file-write",
        description: "Blocks file writes via Bash (cat >, tee, sed -i, cp, heredocs, etc.)",
        severity: Error,
        events: [PreToolUse],
        pack: "security",
    }

    fn evaluate(&self, ctx: &EvaluationContext, _session: &mut SessionState) -> Vec<Finding> {
        let Some(command) = bash_command(ctx) else {
            return Vec::new();
        };
        let option = |key| ctx.rule_option_str_list(self.id(), key).unwrap_or_default();
        if compile_regexes(&option("allow_patterns"))
            .iter()
            .any(|p| p.is_match(command))
        {
            return Vec::new();
        }
        let allow_paths = compile_globs(&option("allow_paths"));

        let targets = target_paths(command);
        let files: Vec<&str> = targets.iter().copied().filter(|t| !is_stream(t)).collect();
        if !targets.is_empty() && files.is_empty() {
            return Vec::new();
        }
        if !allow_paths.is_empty()
            && !files.is_empty()
            && files.iter().all(|f| allow_paths.iter().any(|g| g.is_match(f)))
        {
            return Vec::new();
        }

        let Some((_, label)) = WRITE_PATTERNS.iter().find(|(pattern, label)| {
            pattern.is_match(command)
                && !(*label == "heredoc" && HEREDOC_SUBSTITUTION.is_match(command))
        }) else {
            return Vec::new();
        };
        vec![
            self.finding(format!("Bash file write detected via {label}"))
                .with_file_path(files.first().copied())
                .with_suggestion("Use the Write or Edit tool instead of writing files through Bash."),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use agentlint_core::{HookEvent, RuleSettings};
    use serde_json::json;

    fn bash(command: &str) -> EvaluationContext {
        EvaluationContext::bash(HookEvent::PreToolUse, command)
    }

    fn run(ctx: &EvaluationContext) -> Vec<Finding> {
        NoBashFileWrite.evaluate(ctx, &mut SessionState::new())
    }

    fn with_options(ctx: EvaluationContext, options: serde_json::Value) -> EvaluationContext {
        let mut config = HashMap::new();
        let _ = config.insert("no-bash-file-write".to_string(), RuleSettings::from(options));
        ctx.with_rule_config(config)
    }

    #[test]
    fn detects_each_write_shape() {
        for (command, label, target) in [
            ("echo 'x' > src/app.py", "redirect (>/>>)", Some("src/app.py")),
            ("ls | tee -a out.log", "tee", Some("out.log")),
            ("sed -i 's/a/b/' config.yml", "sed -i", None),
            ("cp template.env .env", "cp", Some(".env")),
            ("mv draft.md README.md", "mv", Some("README.md")),
            ("perl -pi -e 's/a/b/' main.c", "perl -pi -e", None),
            ("dd if=image.iso of=disk.img", "dd of=", Some("disk.img")),
            ("python3 -c \"open('f.txt','w').write('x')\"", "python -c write", None),
            ("cat <<EOF\nhello\nEOF", "heredoc", None),
        ] {
            let findings = run(&bash(command));
            assert_eq!(findings.len(), 1, "{command}");
            assert_eq!(findings[0].message, format!("Bash file write detected via {label}"));
            assert_eq!(findings[0].file_path.as_deref(), target, "{command}");
        }
    }

    #[test]
    fn reads_and_streams_pass() {
        for command in [
            "cat README.md",
            "grep -r TODO src",
            "cargo build 2>&1",
            "echo done > /dev/null",
            "git commit -m \"$(cat <<'EOF'\nFix parser\nEOF\n)\"",
        ] {
            assert!(run(&bash(command)).is_empty(), "{command}");
        }
    }

    #[test]
    fn allowed_paths_and_patterns() {
        let ctx = with_options(bash("echo x > /tmp/scratch/a.txt"), json!({"allow_paths": ["/tmp/*"]}));
        assert!(run(&ctx).is_empty());

        let ctx = with_options(
            bash("echo x > /tmp/a.txt && cp a.txt src/a.txt"),
            json!({"allow_paths": ["/tmp/*"]}),
        );
        assert_eq!(run(&ctx).len(), 1);

        let ctx = with_options(bash("make docs > build.log"), json!({"allow_patterns": ["^make "]}));
        assert!(run(&ctx).is_empty());
    }

    #[test]
    fn invalid_allow_entries_are_ignored() {
        let ctx = with_options(
            bash("echo x > out.txt"),
            json!({"allow_patterns": ["("], "allow_paths": ["a[b"]}),
        );
        assert_eq!(run(&ctx).len(), 1);
    }
}
