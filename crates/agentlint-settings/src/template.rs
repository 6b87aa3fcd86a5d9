//! Starter `agentlint.yml` written by `agentlint init`.

use std::fmt::Write as _;

/// Commented starter config activating `packs`.
pub fn starter_config(packs: &[String]) -> String {
    let mut out = String::from(
        "# AgentLint configuration\n\
         \n\
         stack: auto\n\
         \n\
         severity: standard  # strict | standard | relaxed\n\
         \n\
         packs:\n",
    );
    for pack in packs {
        let _ = writeln!(out, "  - {pack}");
    }
    out.push_str(
        "  # - security  # opt-in: blocks Bash file writes and network exfiltration\n\
         \n\
         rules: {}\n\
         \x20 # Override individual rules:\n\
         \x20 # max-file-size:\n\
         \x20 #   limit: 300\n\
         \x20 # no-push-to-main:\n\
         \x20 #   enabled: false\n\
         \n\
         # circuit_breaker:\n\
         #   degraded_after: 3\n\
         #   passive_after: 6\n\
         #   open_after: 10\n\
         #   reset_after_clean: 5\n\
         #   reset_after_minutes: 30\n",
    );
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
