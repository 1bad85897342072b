//! TCP listener and connection lifecycle.
//!
//! One worker task per accepted connection; the shared [`DirectoryStore`]
//! provides the per-username ordering guarantee, so connections for
//! different usernames proceed fully in parallel.

use crate::connection;
use crate::store::DirectoryStore;
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct Server {
    store: Arc<DirectoryStore>,
}

impl Server {
    pub fn new(store: DirectoryStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Bind to an address and return the TCP listener.
    pub async fn bind(listen_addr: &str) -> Result<TcpListener> {
        let listener = TcpListener::bind(listen_addr).await?;
        info!("listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Accept connections forever, spawning one task per connection.
    pub async fn run(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "accepted connection");
                    let store = Arc::clone(&self.store);
                    tokio::spawn(connection::handle_connection(stream, addr, store));
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}
