//! Persisted session identity.
//!
//! One JSON file holding the fixed `logged_in_user` key, consulted at
//! startup so a remembered user skips the login screen. The store is
//! injected wherever it is needed instead of being read as ambient global
//! state. Exactly one session is active per client install: saving replaces
//! whatever was there.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    logged_in_user: Option<String>,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The conventional `session.json` inside a data directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("session.json"))
    }

    /// The remembered username, if a session is active.
    pub fn load(&self) -> Result<Option<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: SessionFile = serde_json::from_str(&contents)?;
        Ok(session.logged_in_user)
    }

    /// Remember a username, replacing any previous session.
    pub fn save(&self, username: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&SessionFile {
            logged_in_user: Some(username.to_string()),
        })?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Forget the session. Already-absent state is fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
