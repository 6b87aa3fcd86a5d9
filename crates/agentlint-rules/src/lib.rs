//! # agentlint-rules
//!
//! Built-in rule packs. Every rule is a heuristic text check implementing
//! [`agentlint_core::Rule`]; none of them parse code.
//!
//! - [`packs::universal`]: secrets, git safety, destructive commands, test and session hygiene
//! - [`packs::security`]: opt-in checks for shell file writes and network exfiltration
//! - [`packs::python`]: Python-specific code quality
//! - [`packs::react`]: React component conventions
//!
//! [`load_rules`] returns the rules of the requested packs in pack order,
//! then declaration order within each pack.

#![deny(unsafe_code)]

#[macro_use]
mod macros;

pub mod packs;
mod util;

use agentlint_core::Rule;
use tracing::debug;

/// Names of every built-in pack.
pub const PACKS: &[&str] = &["universal", "security", "python", "react"];

/// Rules of one pack, or `None` for an unknown pack name.
pub fn pack_rules(pack: &str) -> Option<Vec<Box<dyn Rule>>> {
    match pack {
        "universal" => Some(packs::universal::rules()),
        "security" => Some(packs::security::rules()),
        "python" => Some(packs::python::rules()),
        "react" => Some(packs::react::rules()),
        _ => None,
    }
}

/// Rules of `packs`, in the order given. Unknown and repeated pack names
/// contribute nothing.
pub fn load_rules<S: AsRef<str>>(packs: &[S]) -> Vec<Box<dyn Rule>> {
    let mut loaded: Vec<&str> = Vec::new();
    let mut rules = Vec::new();
    for pack in packs {
        let pack = pack.as_ref();
        if loaded.contains(&pack) {
            continue;
        }
        match pack_rules(pack) {
            Some(pack_rules) => {
                debug!(pack, count = pack_rules.len(), "loaded rule pack");
                rules.extend(pack_rules);
                loaded.push(pack);
            }
            None => debug!(pack, "no built-in rules for pack"),
        }
    }
    rules
}

/// Every built-in rule.
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    load_rules(PACKS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
