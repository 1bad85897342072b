//! Controller layer: session lifecycle and note operations.
//!
//! [`App`] owns the configuration, the credential store, and the persisted
//! session; a successful login or registration opens a [`Workspace`] — the
//! logged-in user's vault plus its sync channel.
//!
//! Error discipline (three classes, none fatal):
//! - Application errors (empty fields, bad credentials, duplicate username,
//!   existing note) are detected before any network call; no state changes.
//! - Transport failures are surfaced and never auto-retried; local side
//!   effects already applied are not rolled back.
//! - Server rejections are surfaced; the local mutation stands, so the
//!   client may be ahead of the server until the next successful push.

use crate::client::{self, SyncClient, SyncError};
use crate::credentials::CredentialStore;
use crate::session::{SessionError, SessionStore};
use crate::worker::SyncHandle;
use quill_core::vault::{self, Vault, VaultError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Sync server address (host:port).
    pub server_addr: String,
    /// Directory holding vaults and the session file.
    pub data_dir: PathBuf,
    /// Per-request timeout for sync round trips.
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn new(server_addr: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_addr: server_addr.into(),
            data_dir: data_dir.into(),
            request_timeout: client::DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("please fill in all fields")]
    EmptyFields,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("invalid username or password")]
    BadCredentials,

    #[error("username already exists")]
    UsernameTaken,

    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("note already exists: {0}")]
    NoteExists(String),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type Result<T> = std::result::Result<T, AppError>;

pub struct App<C: CredentialStore> {
    config: AppConfig,
    credentials: C,
    session: SessionStore,
}

impl<C: CredentialStore> App<C> {
    pub fn new(config: AppConfig, credentials: C) -> Self {
        let session = SessionStore::in_dir(&config.data_dir);
        Self {
            config,
            credentials,
            session,
        }
    }

    /// Resume the remembered session, if any.
    ///
    /// An unreadable session file counts as "no session" rather than a
    /// startup failure.
    pub async fn startup(&self) -> Result<Option<Workspace>> {
        let username = match self.session.load() {
            Ok(username) => username,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable session file");
                None
            }
        };
        match username {
            Some(username) => Ok(Some(Workspace::open(&self.config, username).await?)),
            None => Ok(None),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Workspace> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::EmptyFields);
        }
        if !self.credentials.verify(username, password) {
            return Err(AppError::BadCredentials);
        }

        self.session.save(username)?;
        info!(username, "login successful");
        Workspace::open(&self.config, username.to_string()).await
    }

    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Workspace> {
        if username.is_empty() || password.is_empty() || confirm.is_empty() {
            return Err(AppError::EmptyFields);
        }
        if password != confirm {
            return Err(AppError::PasswordMismatch);
        }
        if !vault::is_valid_name(username) {
            return Err(AppError::InvalidUsername(username.to_string()));
        }
        if !self.credentials.register(username, password) {
            return Err(AppError::UsernameTaken);
        }

        // Tell the server a vault must be provisioned. Best-effort: the
        // first snapshot pull copes with a user the server has never seen.
        if let Err(e) = client::notify_registration(&self.config.server_addr, username).await {
            warn!(username, error = %e, "could not notify server of registration");
        }

        self.session.save(username)?;
        info!(username, "registration successful");
        Workspace::open(&self.config, username.to_string()).await
    }

    /// End the session: forget the identity, remove the local vault.
    pub async fn logout(&self, workspace: Workspace) -> Result<()> {
        self.session.clear()?;
        if let Err(e) = workspace.vault.purge().await {
            // Recoverable: the session is already gone, and leftover files
            // are overwritten by the next login's snapshot pull.
            warn!(username = %workspace.username, error = %e, "vault purge incomplete");
        }
        info!(username = %workspace.username, "logged out");
        Ok(())
    }
}

/// A logged-in user's vault plus its sync channel.
pub struct Workspace {
    username: String,
    vault: Vault,
    sync: Option<SyncHandle>,
}

impl Workspace {
    /// Open the vault for a user and pull the server snapshot.
    ///
    /// An unreachable server disables syncing for the session instead of
    /// failing the login; every note operation keeps working locally.
    pub async fn open(config: &AppConfig, username: String) -> Result<Self> {
        let vault = Vault::create(Vault::dir_for_user(&config.data_dir, &username)).await?;

        let sync =
            match SyncClient::connect_with_timeout(&config.server_addr, config.request_timeout)
                .await
            {
                Ok(client) => Some(SyncHandle::spawn(client)),
                Err(e) => {
                    warn!(username = %username, error = %e, "sync server unreachable, working locally");
                    None
                }
            };

        let mut workspace = Self {
            username,
            vault,
            sync,
        };
        if workspace.sync.is_some() {
            if let Err(e) = workspace.pull_snapshot().await {
                warn!(username = %workspace.username, error = %e, "snapshot pull failed");
            }
        }
        Ok(workspace)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether a sync channel was established for this session.
    pub fn is_synced(&self) -> bool {
        self.sync.is_some()
    }

    fn sync(&self) -> Result<&SyncHandle> {
        self.sync.as_ref().ok_or(AppError::Sync(SyncError::NotConnected))
    }

    /// Full-state pull: remote content wins for every name in the response;
    /// local files absent from the response are left untouched.
    pub async fn pull_snapshot(&mut self) -> Result<usize> {
        let files = self.sync()?.snapshot(&self.username).await?;
        for file in &files {
            self.vault.write(&file.filename, &file.content).await?;
        }
        info!(username = %self.username, count = files.len(), "snapshot applied");
        Ok(files.len())
    }

    /// Sorted display names of every note.
    pub async fn notes(&self) -> Result<Vec<String>> {
        Ok(self.vault.list().await?)
    }

    pub async fn read_note(&self, name: &str) -> Result<String> {
        Ok(self.vault.read(name).await?)
    }

    /// Create a note locally, then announce it. The local write stands even
    /// when the announcement fails.
    pub async fn create_note(&self, name: &str, content: &str) -> Result<()> {
        if self.vault.exists(name).await? {
            return Err(AppError::NoteExists(vault::display(name).to_string()));
        }
        self.vault.write(name, content).await?;

        if let Some(sync) = &self.sync {
            sync.create(&self.username, &vault::normalize(name), content)
                .await?;
        }
        Ok(())
    }

    /// Save a note locally, then push it. Local-first: a rejected or failed
    /// push leaves the local copy in place.
    pub async fn save_note(&self, name: &str, content: &str) -> Result<()> {
        self.vault.write(name, content).await?;

        if let Some(sync) = &self.sync {
            sync.update(&self.username, &vault::normalize(name), content)
                .await?;
        }
        Ok(())
    }

    /// Delete one note locally and notify the server. The ack content is
    /// not consulted.
    pub async fn delete_note(&self, name: &str) -> Result<()> {
        self.vault.delete(name).await?;

        if let Some(sync) = &self.sync {
            let _ack = sync.delete(&self.username, &vault::normalize(name)).await?;
        }
        Ok(())
    }

    /// Delete a selection: best-effort local deletes (individual failures
    /// ignored), then one notification covering the whole list.
    pub async fn delete_notes(&self, names: &[String]) -> Result<()> {
        let mut filenames = Vec::with_capacity(names.len());
        for name in names {
            if let Err(e) = self.vault.delete(name).await {
                warn!(name = %name, error = %e, "local delete failed");
            }
            filenames.push(vault::normalize(name));
        }

        if let Some(sync) = &self.sync {
            let _ack = sync.delete_many(&self.username, filenames).await?;
        }
        Ok(())
    }
}
