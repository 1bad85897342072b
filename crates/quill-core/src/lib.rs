//! quill-core: shared library for the Quill note synchronization protocol.
//!
//! This crate provides the pieces used by both the client and the server:
//! - Tagged operation envelopes and the newline-delimited JSON framing codec
//! - The on-disk vault store (one directory of note files per user)

pub mod protocol;
pub mod vault;

pub use protocol::{AckStatus, Envelope, FileData, Operation, Response, PROTOCOL_VERSION};
pub use vault::Vault;
