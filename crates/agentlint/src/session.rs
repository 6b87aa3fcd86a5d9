//! Session persistence.
//!
//! One JSON file per agent session under the cache directory. The engine
//! only sees the in-memory [`SessionState`]; loading and saving happen here,
//! around each hook invocation.

use std::io::Write;
use std::path::{Path, PathBuf};

use agentlint_core::SessionState;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable overriding the session directory.
pub const CACHE_DIR_ENV: &str = "AGENTLINT_CACHE_DIR";

/// Environment variable carrying the agent's session ID.
pub const SESSION_ID_ENV: &str = "CLAUDE_SESSION_ID";

/// Errors writing or removing a session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Filesystem failure.
    #[error("session I/O error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The state could not be serialized.
    #[error("session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SessionError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Default session directory: `~/.cache/agentlint/sessions`.
pub fn default_cache_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".cache").join("agentlint").join("sessions")
}

/// Session key from the agent's session ID, else `pid-<parent pid>`.
pub fn session_key(session_id: Option<&str>) -> String {
    match session_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("pid-{}", std::os::unix::process::parent_id()),
    }
}

/// Key safe to use as a file name.
pub fn sanitize_key(key: &str) -> String {
    key.replace(['/', '\\'], "_")
}

/// Session files for one cache directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store from [`CACHE_DIR_ENV`], else [`default_cache_dir`].
    pub fn from_env() -> Self {
        let dir = std::env::var_os(CACHE_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map_or_else(default_cache_dir, PathBuf::from);
        Self::new(dir)
    }

    /// Directory holding the session files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    /// Load the session for `key`. A missing or unreadable file is an empty
    /// session.
    pub fn load(&self, key: &str) -> SessionState {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no session file, starting fresh");
                return SessionState::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read session file, starting fresh");
                return SessionState::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "corrupt session file, starting fresh");
            SessionState::new()
        })
    }

    /// Write the session for `key` through a temp file and rename.
    pub fn save(&self, key: &str, state: &SessionState) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| SessionError::io(&self.dir, e))?;
        let path = self.path_for(key);
        let json = serde_json::to_vec(state)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| SessionError::io(&self.dir, e))?;
        tmp.write_all(&json).map_err(|e| SessionError::io(tmp.path(), e))?;
        let _ = tmp
            .persist(&path)
            .map_err(|e| SessionError::io(&path, e.error))?;
        debug!(path = %path.display(), bytes = json.len(), "saved session");
        Ok(())
    }

    /// Delete the session file for `key`. A missing file is not an error.
    pub fn remove(&self, key: &str) -> Result<(), SessionError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::io(&path, e)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
