//! `tracing` subscriber setup.
//!
//! All diagnostics go to stderr. Stdout belongs to the hook protocol and
//! must only ever carry the JSON response the agent runtime reads.

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Environment variable holding the default log level.
pub const LOG_LEVEL_ENV: &str = "AGENTLINT_LOG_LEVEL";

/// Environment variable selecting the output format (`compact` or `json`).
pub const LOG_FORMAT_ENV: &str = "AGENTLINT_LOG_FORMAT";

/// Level used when neither `RUST_LOG` nor [`LOG_LEVEL_ENV`] is set.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Output format of the stderr subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a format name. Anything other than `json` is compact.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Initialize the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `level` when set. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Initialize from [`LOG_LEVEL_ENV`] and [`LOG_FORMAT_ENV`].
pub fn init_from_env() {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let format = std::env::var(LOG_FORMAT_ENV)
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default();
    init_subscriber(&level, format);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
