//! Sync client: one persistent connection to the directory server.
//!
//! The protocol is strictly half-duplex at the application level: one
//! request, one response, in order — no pipelining. Every round trip runs
//! under a timeout; expiry (or any other transport failure) poisons the
//! connection, so later calls fail fast as [`SyncError::NotConnected`]
//! instead of stalling. Nothing is retried.

use quill_core::protocol::codec::{self, CodecError};
use quill_core::protocol::{FileData, Operation, Response};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("not connected to the sync server")]
    NotConnected,

    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] CodecError),

    #[error("server rejected the operation: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(&'static str),
}

pub type Result<T> = std::result::Result<T, SyncError>;

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

pub struct SyncClient {
    conn: Option<Connection>,
    request_timeout: Duration,
}

impl SyncClient {
    /// Open the connection used for the life of a dashboard session.
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_TIMEOUT).await
    }

    pub async fn connect_with_timeout(addr: &str, request_timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(SyncError::Connect)?;
        stream.set_nodelay(true).ok();
        let (read, writer) = stream.into_split();
        debug!(addr, "connected to sync server");
        Ok(Self {
            conn: Some(Connection {
                reader: BufReader::new(read),
                writer,
            }),
            request_timeout,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// One request, one response. Any failure tears the connection down.
    async fn round_trip(&mut self, op: &Operation) -> Result<Response> {
        // Scope the connection borrow so the failure paths below can drop it.
        let result = {
            let conn = self.conn.as_mut().ok_or(SyncError::NotConnected)?;
            let exchange = async {
                codec::write_frame(&mut conn.writer, op).await?;
                match codec::read_frame::<_, Response>(&mut conn.reader).await? {
                    Some(response) => Ok(response),
                    None => Err(SyncError::Transport(CodecError::UnexpectedEof)),
                }
            };
            timeout(self.request_timeout, exchange).await
        };

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                warn!(kind = op.kind(), error = %e, "transport failure, closing connection");
                self.conn = None;
                Err(e)
            }
            Err(_) => {
                warn!(kind = op.kind(), "request timed out, closing connection");
                self.conn = None;
                Err(SyncError::Timeout)
            }
        }
    }

    async fn expect_success(&mut self, op: Operation) -> Result<()> {
        match self.round_trip(&op).await? {
            response if response.is_success() => Ok(()),
            Response::Ack { message, .. } => Err(SyncError::Rejected(
                message.unwrap_or_else(|| "unspecified server error".into()),
            )),
            Response::SyncResponse { .. } => Err(SyncError::UnexpectedResponse("expected ack")),
        }
    }

    /// Full-state pull of the user's server-side notes.
    pub async fn request_snapshot(&mut self, username: &str) -> Result<Vec<FileData>> {
        let response = self
            .round_trip(&Operation::SyncRequest {
                username: username.into(),
            })
            .await?;
        match response {
            Response::SyncResponse { files } => Ok(files),
            Response::Ack { .. } => Err(SyncError::UnexpectedResponse("expected sync_response")),
        }
    }

    /// Announce a new note. Success requires an explicit SUCCESS ack.
    pub async fn create(&mut self, username: &str, filename: &str, content: &str) -> Result<()> {
        self.expect_success(Operation::CreateFile {
            username: username.into(),
            filename: filename.into(),
            content: content.into(),
        })
        .await
    }

    /// Push new content for a note. Success requires an explicit SUCCESS ack.
    pub async fn update(&mut self, username: &str, filename: &str, content: &str) -> Result<()> {
        self.expect_success(Operation::UpdateFile {
            username: username.into(),
            filename: filename.into(),
            content: content.into(),
        })
        .await
    }

    /// Notify a deletion. The ack is returned as-is: callers proceed
    /// regardless of its content.
    pub async fn delete(&mut self, username: &str, filename: &str) -> Result<Response> {
        self.round_trip(&Operation::DeleteFile {
            username: username.into(),
            filename: filename.into(),
        })
        .await
    }

    /// Notify a multi-selection deletion with the full name list.
    pub async fn delete_many(&mut self, username: &str, filenames: Vec<String>) -> Result<Response> {
        self.round_trip(&Operation::DeleteMultiple {
            username: username.into(),
            filenames,
        })
        .await
    }
}

/// Registration side-channel: a one-shot connection carrying the bare
/// username as plain text, informing the server a vault must be
/// provisioned. No response is expected.
pub async fn notify_registration(addr: &str, username: &str) -> Result<()> {
    let mut stream = TcpStream::connect(addr).await.map_err(SyncError::Connect)?;
    stream
        .write_all(format!("{username}\n").as_bytes())
        .await
        .map_err(|e| SyncError::Transport(e.into()))?;
    stream
        .shutdown()
        .await
        .map_err(|e| SyncError::Transport(e.into()))?;
    Ok(())
}
