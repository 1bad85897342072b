//! Wire protocol for client/server note synchronization.
//!
//! This module defines the protocol spoken over a persistent TCP connection:
//! - Versioned, tagged operation envelopes (one request, one response, in order)
//! - Newline-delimited JSON framing with a frame size cap
//! - Detection of the plain-text registration side-channel

pub mod codec;
pub mod envelope;

pub use codec::{is_envelope_line, read_frame, write_frame, CodecError, MAX_FRAME_SIZE};
pub use envelope::{AckStatus, Envelope, FileData, Operation, Response, PROTOCOL_VERSION};
