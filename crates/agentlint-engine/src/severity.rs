//! Global severity mode and the remapping it applies to findings.

use std::str::FromStr;

use agentlint_core::{Finding, Severity};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::EngineError;

/// How strictly findings are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityMode {
    /// Findings keep their declared severity.
    #[default]
    Standard,
    /// Escalate: WARNING becomes ERROR, INFO becomes WARNING.
    Strict,
    /// De-escalate: WARNING becomes INFO.
    Relaxed,
}

impl SeverityMode {
    /// Lowercase config name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
        }
    }

    /// Parse a mode name, falling back to [`SeverityMode::Standard`] with a
    /// warning when the name is unknown.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|e: EngineError| {
            warn!(error = %e, "falling back to standard severity mode");
            Self::Standard
        })
    }
}

impl std::fmt::Display for SeverityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "strict" => Ok(Self::Strict),
            "relaxed" => Ok(Self::Relaxed),
            _ => Err(EngineError::UnknownSeverityMode(s.to_string())),
        }
    }
}

/// Effective severity of `severity` under `mode`.
#[must_use]
pub fn remap(severity: Severity, mode: SeverityMode) -> Severity {
    match (mode, severity) {
        (SeverityMode::Strict, Severity::Warning) => Severity::Error,
        (SeverityMode::Strict, Severity::Info) => Severity::Warning,
        (SeverityMode::Relaxed, Severity::Warning) => Severity::Info,
        (_, severity) => severity,
    }
}

/// Remap every finding in place.
pub fn remap_all(findings: &mut [Finding], mode: SeverityMode) {
    if mode == SeverityMode::Standard {
        return;
    }
    for finding in findings {
        finding.severity = remap(finding.severity, mode);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn standard_is_identity() {
        for sev in [Severity::Info, Severity::Warning, Severity::Error] {
            assert_eq!(remap(sev, SeverityMode::Standard), sev);
        }
    }

    #[test]
    fn strict_escalates() {
        assert_eq!(remap(Severity::Warning, SeverityMode::Strict), Severity::Error);
        assert_eq!(remap(Severity::Info, SeverityMode::Strict), Severity::Warning);
        assert_eq!(remap(Severity::Error, SeverityMode::Strict), Severity::Error);
    }

    #[test]
    fn relaxed_deescalates_warnings_only() {
        assert_eq!(remap(Severity::Warning, SeverityMode::Relaxed), Severity::Info);
        assert_eq!(remap(Severity::Error, SeverityMode::Relaxed), Severity::Error);
        assert_eq!(remap(Severity::Info, SeverityMode::Relaxed), Severity::Info);
    }

    #[test]
    fn remap_all_rewrites_in_place() {
        let mut findings = vec![
            Finding::new("a", Severity::Warning, "w"),
            Finding::new("b", Severity::Info, "i"),
        ];
        remap_all(&mut findings, SeverityMode::Strict);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[1].severity, Severity::Warning);
        assert_eq!(findings[0].message, "w");
    }

    #[test]
    fn parse_modes() {
        assert_eq!("Strict".parse::<SeverityMode>().unwrap(), SeverityMode::Strict);
        assert_matches!(
            "paranoid".parse::<SeverityMode>(),
            Err(EngineError::UnknownSeverityMode(_))
        );
    }

    #[test]
    fn lenient_parse_falls_back_and_warns() {
        let (logs, _guard) = agentlint_core::logging::capture_logs();
        assert_eq!(SeverityMode::parse_lenient("loud"), SeverityMode::Standard);
        assert!(logs.has_event(tracing::Level::WARN, "falling back"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn severity() -> impl Strategy<Value = Severity> {
            prop_oneof![Just(Severity::Info), Just(Severity::Warning), Just(Severity::Error)]
        }

        proptest! {
            #[test]
            fn error_is_never_deescalated(mode in prop_oneof![
                Just(SeverityMode::Standard),
                Just(SeverityMode::Strict),
                Just(SeverityMode::Relaxed),
            ]) {
                prop_assert_eq!(remap(Severity::Error, mode), Severity::Error);
            }

            #[test]
            fn strict_never_lowers(sev in severity()) {
                prop_assert!(remap(sev, SeverityMode::Strict) >= sev);
            }

            #[test]
            fn relaxed_never_raises(sev in severity()) {
                prop_assert!(remap(sev, SeverityMode::Relaxed) <= sev);
            }
        }
    }
}
