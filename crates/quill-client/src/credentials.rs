//! Credential store: the external collaborator that authenticates users.
//!
//! The surrounding system keeps accounts in its own store; the sync
//! subsystem only ever needs two answers from it, so it is modeled as a
//! trait seam. [`MemoryCredentials`] backs tests; [`FileCredentials`] gives
//! the CLI a local JSON-backed store. Password policy is out of scope here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt credential file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub trait CredentialStore {
    /// Check a username/password pair.
    fn verify(&self, username: &str, password: &str) -> bool;

    /// Add a new user. Returns false if the username is already taken.
    fn register(&mut self, username: &str, password: &str) -> bool;
}

/// In-memory credentials for tests.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    users: HashMap<String, String>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixture helper: a store pre-seeded with one account.
    pub fn with_user(username: &str, password: &str) -> Self {
        let mut store = Self::new();
        store.register(username, password);
        store
    }
}

impl CredentialStore for MemoryCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users.get(username).is_some_and(|p| p == password)
    }

    fn register(&mut self, username: &str, password: &str) -> bool {
        if self.users.contains_key(username) {
            return false;
        }
        self.users.insert(username.to_string(), password.to_string());
        true
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: HashMap<String, String>,
}

/// JSON-file-backed credentials for local CLI use.
pub struct FileCredentials {
    path: PathBuf,
    users: HashMap<String, String>,
}

impl FileCredentials {
    /// Open (or start) a credential file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let path = path.into();
        let users = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<CredentialFile>(&contents)?.users,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, users })
    }

    fn persist(&self) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&CredentialFile {
            users: self.users.clone(),
        })?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users.get(username).is_some_and(|p| p == password)
    }

    fn register(&mut self, username: &str, password: &str) -> bool {
        if self.users.contains_key(username) {
            return false;
        }
        self.users.insert(username.to_string(), password.to_string());
        if let Err(e) = self.persist() {
            warn!(username, error = %e, "failed to persist credentials");
            self.users.remove(username);
            return false;
        }
        true
    }
}
