//! Changed-file discovery through the `git` CLI.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Absolute paths of files changed against `HEAD` (staged and unstaged)
/// plus untracked files, sorted and deduplicated. Empty outside a git
/// repository or when `git` is unavailable.
pub fn changed_files(project_dir: &Path) -> Vec<String> {
    let mut files = BTreeSet::new();
    for args in [
        &["diff", "--name-only", "HEAD"][..],
        &["ls-files", "--others", "--exclude-standard"][..],
    ] {
        for name in git_lines(project_dir, args) {
            let _ = files.insert(project_dir.join(name).to_string_lossy().into_owned());
        }
    }
    files.into_iter().collect()
}

fn git_lines(project_dir: &Path, args: &[&str]) -> Vec<String> {
    let output = match Command::new("git").args(args).current_dir(project_dir).output() {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "failed to run git");
            return Vec::new();
        }
    };
    if !output.status.success() {
        debug!(
            ?args,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git command failed"
        );
        return Vec::new();
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
