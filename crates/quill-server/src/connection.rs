//! Per-connection request loop.
//!
//! Each accepted connection runs CONNECTED → receive operation → APPLY →
//! RESPOND → (repeat) → CLOSED on disconnect. Exactly one response per
//! request, in receipt order; a malformed or oversized frame closes the
//! connection without a reply, since answering an unparseable request would
//! desynchronize the request/response pairing.
//!
//! The registration side-channel arrives on the same listener: a plain-text
//! username line (not an envelope) provisions a note set and gets no
//! response.

use crate::store::DirectoryStore;
use quill_core::protocol::{codec, Operation};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::{debug, warn};

pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, store: Arc<DirectoryStore>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let line = match codec::read_line(&mut reader).await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(%addr, "connection closed");
                break;
            }
            Err(e) => {
                warn!(%addr, error = %e, "transport failure, closing connection");
                break;
            }
        };

        if !codec::is_envelope_line(&line) {
            // Registration side-channel: a bare username, no response expected.
            let username = String::from_utf8_lossy(&line).trim().to_string();
            if username.is_empty() {
                continue;
            }
            if let Err(e) = store.provision(&username).await {
                warn!(%addr, username = %username, error = %e, "failed to provision user");
            }
            continue;
        }

        let op: Operation = match codec::decode_frame(&line) {
            Ok(op) => op,
            Err(e) => {
                warn!(%addr, error = %e, "malformed operation, closing connection");
                break;
            }
        };

        debug!(%addr, kind = op.kind(), username = op.username(), "applying operation");
        let response = store.apply(&op).await;

        if let Err(e) = codec::write_frame(&mut write_half, &response).await {
            warn!(%addr, error = %e, "failed to send response, closing connection");
            break;
        }
    }
}
