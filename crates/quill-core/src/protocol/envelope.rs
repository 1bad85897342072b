//! Operation envelope types for client/server messages.
//!
//! These types define the JSON wire format for sync requests and responses.
//! Each logical message is a tagged union (`kind` field + typed fields per
//! kind) wrapped in a versioned [`Envelope`], replacing any ad-hoc or opaque
//! object-graph serialization with an explicit schema.

use serde::{Deserialize, Serialize};

/// Protocol version carried in every frame envelope.
///
/// Frames with a higher version than ours are rejected at the codec layer
/// rather than misinterpreted.
pub const PROTOCOL_VERSION: u16 = 1;

/// A single note travelling over the wire.
///
/// `filename` always carries the normalized `.txt` suffix; display names are
/// a client-side concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    pub filename: String,
    pub content: String,
}

impl FileData {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// A request operation sent from client to server.
///
/// Wire format: `{"kind":"create_file","username":"u","filename":"a.txt","content":"hi"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Full-state pull of the user's server-side notes.
    SyncRequest {
        username: String,
    },
    CreateFile {
        username: String,
        filename: String,
        content: String,
    },
    UpdateFile {
        username: String,
        filename: String,
        content: String,
    },
    DeleteFile {
        username: String,
        filename: String,
    },
    /// One request covering a whole multi-selection delete.
    DeleteMultiple {
        username: String,
        filenames: Vec<String>,
    },
}

impl Operation {
    /// The username the operation applies to.
    pub fn username(&self) -> &str {
        match self {
            Operation::SyncRequest { username }
            | Operation::CreateFile { username, .. }
            | Operation::UpdateFile { username, .. }
            | Operation::DeleteFile { username, .. }
            | Operation::DeleteMultiple { username, .. } => username,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::SyncRequest { .. } => "sync_request",
            Operation::CreateFile { .. } => "create_file",
            Operation::UpdateFile { .. } => "update_file",
            Operation::DeleteFile { .. } => "delete_file",
            Operation::DeleteMultiple { .. } => "delete_multiple",
        }
    }
}

/// Acknowledgement status for mutating operations.
///
/// Serialized as the literal strings `"SUCCESS"` / `"ERROR"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckStatus {
    Success,
    Error,
}

/// A response sent from server to client; exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// Answer to [`Operation::SyncRequest`]: the user's full current set.
    SyncResponse {
        files: Vec<FileData>,
    },
    /// Answer to every mutating operation.
    Ack {
        status: AckStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Response {
    pub fn success() -> Self {
        Response::Ack {
            status: AckStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Ack {
            status: AckStatus::Error,
            message: Some(message.into()),
        }
    }

    /// True only for a successful acknowledgement.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Response::Ack {
                status: AckStatus::Success,
                ..
            }
        )
    }
}

/// Versioned frame envelope wrapping every message on the wire.
///
/// Wire format: `{"v":1,"msg":{...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub v: u16,
    pub msg: T,
}

impl<T> Envelope<T> {
    /// Wrap a message in the current protocol version.
    pub fn new(msg: T) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            msg,
        }
    }
}
