//! Injectable session state.
//!
//! The original console kept the API key and current selection in ambient
//! browser storage; here the remembered state is an explicit object with
//! defined load/save hooks so callers pass it around and tests stay isolated.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// State remembered across console sessions. Everything is optional; an empty
/// state is the well-defined starting point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// Bearer token for mutating actions; never logged
    pub api_key: String,
    /// Last selected incident id, restored as the initial deep link
    pub selected_incident: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse session file: {0}")]
    Parse(String),

    #[error("Failed to serialize session state: {0}")]
    Serialize(String),
}

/// Load/save lifecycle hooks for session state.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<SessionState, SessionError>;
    fn save(&self, state: &SessionState) -> Result<(), SessionError>;
}

/// In-memory store; the default for tests and one-shot CLI invocations.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: Mutex<SessionState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionState, SessionError> {
        Ok(self.state.lock().expect("session lock poisoned").clone())
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        *self.state.lock().expect("session lock poisoned") = state.clone();
        Ok(())
    }
}

/// TOML-file-backed store for interactive use. A missing file loads as the
/// empty state.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<SessionState, SessionError> {
        if !self.path.exists() {
            return Ok(SessionState::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| SessionError::Parse(e.to_string()))
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(state).map_err(|e| SessionError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
