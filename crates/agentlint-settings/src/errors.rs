//! Settings error types.

use agentlint_engine::EngineError;
use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the config file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid YAML.
    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The merged config does not fit the settings schema.
    #[error("invalid config structure: {0}")]
    Json(#[from] serde_json::Error),
    /// A value parsed but is not usable.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    /// Circuit-breaker or severity settings failed validation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
