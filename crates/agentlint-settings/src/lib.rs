//! # agentlint-settings
//!
//! Project configuration for AgentLint.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`AgentLintSettings::default()`]
//! 2. **Project file**: the first of `agentlint.yml`, `agentlint.yaml`,
//!    `.agentlint.yml` in the project directory (deep-merged over defaults)
//! 3. **Environment variables**: `AGENTLINT_SEVERITY`, `AGENTLINT_PACKS`
//!
//! [`AgentLintSettings::to_engine_config`] resolves the active packs
//! (explicit list, else stack detection) and hands the engine everything it
//! needs.

#![deny(unsafe_code)]

pub mod detector;
pub mod errors;
pub mod loader;
pub mod template;
pub mod types;

pub use detector::detect_stack;
pub use errors::{Result, SettingsError};
pub use loader::{
    CONFIG_FILENAMES, apply_overrides, config_path, deep_merge, load_settings,
    load_settings_from_path, load_settings_with,
};
pub use template::starter_config;
pub use types::{AgentLintSettings, StackMode};
