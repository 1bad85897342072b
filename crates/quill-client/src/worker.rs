//! Worker task owning the sync connection.
//!
//! The interaction layer never touches the network directly: it enqueues
//! typed commands on a channel and awaits the reply on a oneshot. The single
//! worker task owning the [`SyncClient`] is what enforces the half-duplex
//! contract — no second request leaves before the prior response arrives —
//! and keeps callers responsive regardless of network latency.

use crate::client::{Result, SyncClient, SyncError};
use quill_core::protocol::{FileData, Response};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

enum SyncCommand {
    Snapshot {
        username: String,
        reply: oneshot::Sender<Result<Vec<FileData>>>,
    },
    Create {
        username: String,
        filename: String,
        content: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Update {
        username: String,
        filename: String,
        content: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Delete {
        username: String,
        filename: String,
        reply: oneshot::Sender<Result<Response>>,
    },
    DeleteMany {
        username: String,
        filenames: Vec<String>,
        reply: oneshot::Sender<Result<Response>>,
    },
}

/// Handle for enqueueing sync commands.
///
/// Clones share the same worker and therefore the same connection.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncCommand>,
}

impl SyncHandle {
    /// Spawn the worker task around a connected client.
    pub fn spawn(client: SyncClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(client, rx));
        Self { tx }
    }

    pub async fn snapshot(&self, username: &str) -> Result<Vec<FileData>> {
        let (reply, rx) = oneshot::channel();
        self.send(SyncCommand::Snapshot {
            username: username.into(),
            reply,
        })?;
        rx.await.map_err(|_| SyncError::NotConnected)?
    }

    pub async fn create(&self, username: &str, filename: &str, content: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SyncCommand::Create {
            username: username.into(),
            filename: filename.into(),
            content: content.into(),
            reply,
        })?;
        rx.await.map_err(|_| SyncError::NotConnected)?
    }

    pub async fn update(&self, username: &str, filename: &str, content: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SyncCommand::Update {
            username: username.into(),
            filename: filename.into(),
            content: content.into(),
            reply,
        })?;
        rx.await.map_err(|_| SyncError::NotConnected)?
    }

    pub async fn delete(&self, username: &str, filename: &str) -> Result<Response> {
        let (reply, rx) = oneshot::channel();
        self.send(SyncCommand::Delete {
            username: username.into(),
            filename: filename.into(),
            reply,
        })?;
        rx.await.map_err(|_| SyncError::NotConnected)?
    }

    pub async fn delete_many(&self, username: &str, filenames: Vec<String>) -> Result<Response> {
        let (reply, rx) = oneshot::channel();
        self.send(SyncCommand::DeleteMany {
            username: username.into(),
            filenames,
            reply,
        })?;
        rx.await.map_err(|_| SyncError::NotConnected)?
    }

    fn send(&self, cmd: SyncCommand) -> Result<()> {
        self.tx.send(cmd).map_err(|_| SyncError::NotConnected)
    }
}

/// Drains commands one at a time until every handle is gone.
async fn run_worker(mut client: SyncClient, mut rx: mpsc::UnboundedReceiver<SyncCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            SyncCommand::Snapshot { username, reply } => {
                let _ = reply.send(client.request_snapshot(&username).await);
            }
            SyncCommand::Create {
                username,
                filename,
                content,
                reply,
            } => {
                let _ = reply.send(client.create(&username, &filename, &content).await);
            }
            SyncCommand::Update {
                username,
                filename,
                content,
                reply,
            } => {
                let _ = reply.send(client.update(&username, &filename, &content).await);
            }
            SyncCommand::Delete {
                username,
                filename,
                reply,
            } => {
                let _ = reply.send(client.delete(&username, &filename).await);
            }
            SyncCommand::DeleteMany {
                username,
                filenames,
                reply,
            } => {
                let _ = reply.send(client.delete_many(&username, filenames).await);
            }
        }
    }
    debug!("sync worker stopped");
}
