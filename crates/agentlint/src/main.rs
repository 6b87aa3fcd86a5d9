//! # agentlint
//!
//! Hook handler binary. The agent runtime invokes `agentlint check` on each
//! lifecycle event with the hook payload on stdin and reads the JSON
//! response from stdout. Exit code 2 blocks the action.

#![deny(unsafe_code)]

mod commands;
mod git;
mod hook_input;
mod reporter;
mod session;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::commands::Runtime;
use crate::session::{SESSION_ID_ENV, SessionStore};

/// Environment variable naming the project root.
const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Guardrails for AI coding agents.
#[derive(Parser, Debug)]
#[command(name = "agentlint", version, about = "Guardrails for AI coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    /// Project directory (defaults to `$CLAUDE_PROJECT_DIR`, then the
    /// current directory).
    #[arg(long)]
    project_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one hook event read from stdin.
    Check {
        /// Hook event name, e.g. `PreToolUse`.
        #[arg(long)]
        event: String,
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Print the end-of-session report and clear the session.
    Report {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// List the built-in rules.
    ListRules {
        /// Only list rules of this pack.
        #[arg(long)]
        pack: Option<String>,
    },
    /// Show the active configuration for the project.
    Status {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Diagnose common misconfigurations.
    Doctor {
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Write a starter `agentlint.yml` for the project.
    Init {
        #[command(flatten)]
        project: ProjectArgs,
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

impl ProjectArgs {
    fn resolve(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.project_dir {
            return Ok(dir.clone());
        }
        if let Some(dir) = std::env::var_os(PROJECT_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        std::env::current_dir().context("Failed to read current directory")
    }

    fn runtime(&self) -> Result<Runtime> {
        let session_id = std::env::var(SESSION_ID_ENV).ok();
        Ok(Runtime {
            project_dir: self.resolve()?,
            store: SessionStore::from_env(),
            session_key: session::session_key(session_id.as_deref()),
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Hook payload from stdin. Unreadable input is treated as empty.
fn read_stdin() -> String {
    std::io::read_to_string(std::io::stdin()).unwrap_or_else(|e| {
        debug!(error = %e, "failed to read stdin");
        String::new()
    })
}

fn run(cli: Cli) -> Result<u8> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = match cli.command {
        Command::Check { event, project } => {
            let rt = project.runtime()?;
            commands::check(&rt, &event, &read_stdin(), env_lookup, &mut out)?
        }
        Command::Report { project } => {
            let rt = project.runtime()?;
            // The payload carries nothing the report uses.
            let _ = read_stdin();
            commands::report(&rt, env_lookup, git::changed_files, &mut out)?
        }
        Command::ListRules { pack } => commands::list_rules(pack.as_deref(), &mut out)?,
        Command::Status { project } => commands::status(&project.runtime()?, env_lookup, &mut out)?,
        Command::Doctor { project } => commands::doctor(&project.runtime()?, &mut out)?,
        Command::Init { project, force } => commands::init(&project.resolve()?, force, &mut out)?,
    };
    out.flush()?;
    Ok(code)
}

fn main() -> ExitCode {
    agentlint_core::logging::init_from_env();

    // clap exits with 2 on usage errors, which the agent runtime would read
    // as "block"; usage errors exit 1 instead.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(u8::from(e.use_stderr()));
        }
    };

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("agentlint: {e:#}");
            ExitCode::from(1)
        }
    }
}
