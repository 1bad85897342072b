//! Durable per-username note sets.
//!
//! The store holds one directory per username under its data root and is the
//! single place operations are applied. Same-username operations are
//! serialized through a per-username mutex — applied one at a time in receipt
//! order, so racing writes from two devices cannot interleave — while
//! different usernames proceed fully in parallel. No lock is shared across
//! usernames.

use quill_core::protocol::{FileData, Operation, Response};
use quill_core::vault::{self, Vault, VaultError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct DirectoryStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, username: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(username.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn user_vault(&self, username: &str) -> Vault {
        Vault::new(self.root.join(username))
    }

    /// Provision an empty note set for a newly registered username.
    pub async fn provision(&self, username: &str) -> Result<(), VaultError> {
        if !vault::is_valid_name(username) {
            return Err(VaultError::InvalidName(username.to_string()));
        }
        let lock = self.user_lock(username).await;
        let _guard = lock.lock().await;
        Vault::create(self.root.join(username)).await?;
        info!(username, "provisioned note set");
        Ok(())
    }

    /// The full current set for a username. A username we have never seen
    /// has an empty set.
    pub async fn snapshot(&self, username: &str) -> Result<Vec<FileData>, VaultError> {
        let vault = self.user_vault(username);
        let mut files = Vec::new();
        for name in vault.list().await? {
            let filename = vault::normalize(&name);
            let content = vault.read(&name).await?;
            files.push(FileData { filename, content });
        }
        Ok(files)
    }

    /// Apply one operation and produce its response.
    ///
    /// Each operation is acknowledged independently; there are no
    /// multi-operation transactions.
    pub async fn apply(&self, op: &Operation) -> Response {
        let username = op.username();
        if !vault::is_valid_name(username) {
            return Response::error(format!("invalid username: {username:?}"));
        }

        let lock = self.user_lock(username).await;
        let _guard = lock.lock().await;

        match self.apply_locked(op).await {
            Ok(response) => response,
            Err(e) => {
                warn!(username, kind = op.kind(), error = %e, "operation failed");
                Response::error(e.to_string())
            }
        }
    }

    async fn apply_locked(&self, op: &Operation) -> Result<Response, VaultError> {
        let vault = self.user_vault(op.username());
        match op {
            Operation::SyncRequest { username } => {
                let files = self.snapshot(username).await?;
                Ok(Response::SyncResponse { files })
            }
            // Create on an existing name overwrites: the client reuses the
            // same path for create and update, and both carry full content.
            Operation::CreateFile {
                filename, content, ..
            }
            | Operation::UpdateFile {
                filename, content, ..
            } => {
                vault.write(filename, content).await?;
                Ok(Response::success())
            }
            Operation::DeleteFile { filename, .. } => {
                // Deleting a name that is not there is a no-op, not an error.
                vault.delete(filename).await?;
                Ok(Response::success())
            }
            Operation::DeleteMultiple { filenames, .. } => {
                let mut failed = Vec::new();
                for filename in filenames {
                    if let Err(e) = vault.delete(filename).await {
                        warn!(filename = %filename, error = %e, "delete failed");
                        failed.push(filename.as_str());
                    }
                }
                if failed.is_empty() {
                    Ok(Response::success())
                } else {
                    Ok(Response::error(format!(
                        "failed to delete: {}",
                        failed.join(", ")
                    )))
                }
            }
        }
    }
}
