//! Framing codec: newline-delimited JSON over a persistent byte stream.
//!
//! One envelope per line, `\n` terminated. JSON string escaping keeps note
//! content line-safe, so a frame boundary is always a real message boundary.
//! A truncated line (EOF mid-frame), an over-limit line, or a line that does
//! not parse is a transport-level failure surfaced to the caller — never
//! silently retried.
//!
//! The registration side-channel sends a bare username as plain text on a
//! one-shot connection. [`is_envelope_line`] tells the two apart: envelope
//! frames start with `{`, a username does not.

use crate::protocol::envelope::{Envelope, PROTOCOL_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (16 MiB) to prevent memory exhaustion from a
/// misbehaving peer.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("connection closed mid-frame")]
    UnexpectedEof,

    #[error("frame exceeds {MAX_FRAME_SIZE} bytes")]
    FrameTooLarge,

    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u16),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Serialize one message into a versioned envelope frame and flush it.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(&Envelope {
        v: PROTOCOL_VERSION,
        msg,
    })?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one raw frame line, without its trailing newline.
///
/// Returns `Ok(None)` on a clean end of stream (EOF before any byte of a
/// frame). EOF in the middle of a line is [`CodecError::UnexpectedEof`].
pub async fn read_line<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    // Bound the read so a peer cannot make us buffer an unbounded line.
    let mut limited = reader.take(MAX_FRAME_SIZE as u64 + 2);
    let n = limited.read_until(b'\n', &mut buf).await?;

    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        if buf.len() > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge);
        }
        return Err(CodecError::UnexpectedEof);
    }
    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge);
    }
    Ok(Some(buf))
}

/// Decode an envelope frame line into its message.
pub fn decode_frame<T: DeserializeOwned>(line: &[u8]) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_slice(line)?;
    if envelope.v > PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(envelope.v));
    }
    Ok(envelope.msg)
}

/// Read and decode the next envelope frame.
///
/// Returns `Ok(None)` on a clean end of stream.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    match read_line(reader).await? {
        Some(line) => decode_frame(&line).map(Some),
        None => Ok(None),
    }
}

/// Check whether a frame line is an envelope (as opposed to the plain-text
/// registration side-channel).
pub fn is_envelope_line(line: &[u8]) -> bool {
    line.first() == Some(&b'{')
}
