//! Subcommand implementations.
//!
//! Each command writes its stdout to `out` and returns the process exit
//! code. Environment lookups happen in `main`; everything here takes its
//! inputs explicitly.

use std::io::Write;
use std::path::{Path, PathBuf};

use agentlint_core::{HookEvent, Rule, SessionState, Severity};
use agentlint_engine::{Engine, EngineConfig};
use agentlint_rules::packs::universal::TOKEN_BUDGET_KEY;
use agentlint_settings::{AgentLintSettings, CONFIG_FILENAMES, SettingsError};
use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::{info, warn};

use crate::hook_input::{self, HookInput};
use crate::reporter;
use crate::session::SessionStore;

/// Where a command finds its project and session.
#[derive(Debug, Clone)]
pub struct Runtime {
    /// Project root.
    pub project_dir: PathBuf,
    /// Session file store.
    pub store: SessionStore,
    /// Key of the current session.
    pub session_key: String,
}

/// Settings for hook commands. A broken config file must never block the
/// agent, so failures fall back to defaults with overrides still applied.
fn hook_settings(
    project_dir: &Path,
    lookup: impl Fn(&str) -> Option<String> + Copy,
) -> AgentLintSettings {
    agentlint_settings::load_settings_with(project_dir, lookup).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        let mut settings = AgentLintSettings::default();
        agentlint_settings::apply_overrides(&mut settings, lookup);
        settings
    })
}

fn engine_config(settings: &AgentLintSettings, project_dir: &Path) -> EngineConfig {
    let config = settings.to_engine_config(project_dir);
    if let Err(e) = settings.validate() {
        warn!(error = %e, "config has invalid values, lenient defaults apply");
    }
    config
}

fn build_engine(config: EngineConfig) -> Engine {
    let rules = agentlint_rules::load_rules(&config.active_packs);
    Engine::with_rules(config, rules)
}

/// `agentlint check`: evaluate one hook event.
pub fn check(
    rt: &Runtime,
    event: &str,
    raw_input: &str,
    lookup: impl Fn(&str) -> Option<String> + Copy,
    out: &mut impl Write,
) -> Result<u8> {
    let event: HookEvent = event.parse().context("invalid --event")?;
    let settings = hook_settings(&rt.project_dir, lookup);
    let engine = build_engine(engine_config(&settings, &rt.project_dir));

    let mut session = rt.store.load(&rt.session_key);
    let input = HookInput::parse(raw_input);
    let ctx = hook_input::build_context(
        event,
        input,
        &rt.project_dir,
        settings.rules.clone(),
        &mut session,
    );
    let result = engine.evaluate(&ctx, &mut session);

    if let Err(e) = rt.store.save(&rt.session_key, &session) {
        warn!(error = %e, "failed to save session");
    }

    if let Some(output) = reporter::hook_output(&result) {
        writeln!(out, "{output}")?;
    }
    let code = reporter::exit_code(&result);
    if code == reporter::EXIT_BLOCK {
        info!(event = %event, blocked = result.count(Severity::Error), "action blocked");
    }
    Ok(code)
}

/// `agentlint report`: end-of-session evaluation and summary. Consumes the
/// session file.
pub fn report(
    rt: &Runtime,
    lookup: impl Fn(&str) -> Option<String> + Copy,
    changed_files: impl FnOnce(&Path) -> Vec<String>,
    out: &mut impl Write,
) -> Result<u8> {
    let mut session = rt.store.load(&rt.session_key);
    let mut files = session.changed_files();
    if files.is_empty() {
        files = changed_files(&rt.project_dir);
    }
    let files_changed = files.len();
    session.set_changed_files(files);

    let settings = hook_settings(&rt.project_dir, lookup);
    let engine = build_engine(engine_config(&settings, &rt.project_dir));
    let ctx = hook_input::build_context(
        HookEvent::Stop,
        HookInput::default(),
        &rt.project_dir,
        settings.rules.clone(),
        &mut session,
    );
    let before = session.circuit_breaker.clone();
    let result = engine.evaluate(&ctx, &mut session);

    let breakers = reporter::tripped_breakers(&before, &session.circuit_breaker);
    let text = reporter::session_report(&result, files_changed, &breakers);
    writeln!(out, "{}", json!({ "systemMessage": text, "continue": true }))?;

    if let Err(e) = rt.store.remove(&rt.session_key) {
        warn!(error = %e, "failed to remove session file");
    }
    Ok(0)
}

/// `agentlint list-rules`: table of built-in rules.
pub fn list_rules(pack: Option<&str>, out: &mut impl Write) -> Result<u8> {
    let mut rules = match pack {
        Some(pack) => agentlint_rules::pack_rules(pack).unwrap_or_default(),
        None => agentlint_rules::all_rules(),
    };
    if rules.is_empty() {
        match pack {
            Some(pack) => writeln!(out, "No rules found for pack '{pack}'.")?,
            None => writeln!(out, "No rules found.")?,
        }
        return Ok(0);
    }

    rules.sort_by(|a, b| {
        (a.pack(), first_event(&**a), a.id()).cmp(&(b.pack(), first_event(&**b), b.id()))
    });

    writeln!(out, "{:<30} {:<12} {:<14} {:<10} Description", "Rule ID", "Pack", "Event", "Severity")?;
    writeln!(out, "{}", "-".repeat(100))?;
    for rule in &rules {
        writeln!(
            out,
            "{:<30} {:<12} {:<14} {:<10} {}",
            rule.id(),
            rule.pack(),
            first_event(&**rule),
            rule.severity().as_str(),
            rule.description()
        )?;
    }
    writeln!(out, "\n{} rules total.", rules.len())?;
    Ok(0)
}

fn first_event(rule: &dyn Rule) -> &'static str {
    rule.events().first().map_or("-", |e| e.as_str())
}

/// `agentlint status`: active configuration and session activity.
pub fn status(
    rt: &Runtime,
    lookup: impl Fn(&str) -> Option<String> + Copy,
    out: &mut impl Write,
) -> Result<u8> {
    let settings = agentlint_settings::load_settings_with(&rt.project_dir, lookup)
        .context("failed to load config")?;
    let config = settings.to_engine_config(&rt.project_dir);
    let engine = build_engine(config.clone());
    let active = engine
        .rules()
        .iter()
        .filter(|r| config.is_rule_enabled(r.id()))
        .count();

    let session = rt.store.load(&rt.session_key);
    let total_calls = tool_calls_tracked(&session);

    writeln!(
        out,
        "AgentLint v{} | Severity: {} | Packs: {}",
        env!("CARGO_PKG_VERSION"),
        settings.severity_mode(),
        config.active_packs.join(", ")
    )?;
    writeln!(out, "Rules: {active} active | Session: {total_calls} tool calls tracked")?;
    Ok(0)
}

fn tool_calls_tracked(session: &SessionState) -> u64 {
    session
        .get(TOKEN_BUDGET_KEY)
        .and_then(|budget| budget.get("total_calls"))
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

/// `agentlint doctor`: diagnose configuration and environment problems.
pub fn doctor(rt: &Runtime, out: &mut impl Write) -> Result<u8> {
    let mut ok = Vec::new();
    let mut issues = Vec::new();

    match agentlint_settings::config_path(&rt.project_dir) {
        Some(path) => {
            ok.push(format!("Config file: {} found", file_name(&path)));
            match agentlint_settings::load_settings_from_path(&path) {
                Ok(settings) => {
                    ok.push("Config: parses".to_string());
                    match settings.validate() {
                        Ok(()) => ok.push("Config: severity and circuit breaker values are valid".to_string()),
                        Err(e) => issues.push(format!("Config: {e}")),
                    }
                }
                Err(e) => issues.push(format!("Config: {}", describe(&e))),
            }
        }
        None => issues.push(format!(
            "Config file: {} not found. Run 'agentlint init' to create one.",
            CONFIG_FILENAMES[0]
        )),
    }

    let dir = rt.store.dir();
    if !dir.exists() {
        ok.push(format!("Session cache: {} (will be created)", dir.display()));
    } else if tempfile::tempfile_in(dir).is_ok() {
        ok.push(format!("Session cache: {} (writable)", dir.display()));
    } else {
        issues.push(format!("Session cache: {} is not writable", dir.display()));
    }

    for item in &ok {
        writeln!(out, "  OK  {item}")?;
    }
    for item in &issues {
        writeln!(out, "  !!  {item}")?;
    }
    if issues.is_empty() {
        writeln!(out, "\nAll checks passed.")?;
    } else {
        writeln!(out, "\n{} issue(s) found.", issues.len())?;
    }
    Ok(0)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn describe(err: &SettingsError) -> String {
    match err {
        SettingsError::Yaml(e) => format!("invalid YAML: {e}"),
        other => other.to_string(),
    }
}

/// `agentlint init`: write a starter config with the detected packs.
pub fn init(project_dir: &Path, force: bool, out: &mut impl Write) -> Result<u8> {
    if let Some(existing) = agentlint_settings::config_path(project_dir).filter(|_| !force) {
        bail!("{} already exists (use --force to overwrite)", existing.display());
    }
    let packs = agentlint_settings::detect_stack(project_dir);
    let path = project_dir.join(CONFIG_FILENAMES[0]);
    std::fs::write(&path, agentlint_settings::starter_config(&packs))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    writeln!(out, "Created {}", path.display())?;
    writeln!(out, "Detected packs: {}", packs.join(", "))?;
    Ok(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
