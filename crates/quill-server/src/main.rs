//! quill-server: central directory server for Quill note vaults.
//!
//! Holds one durable note set per username and serves snapshot pulls and
//! per-mutation operations from any number of concurrent clients.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quill_server::server::Server;
use quill_server::store::DirectoryStore;

#[derive(Parser, Debug)]
#[command(name = "quill-server")]
#[command(about = "Central note directory server")]
struct Args {
    /// Directory holding one note set per username
    #[arg(short, long, default_value = "quill-data")]
    data: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:12345")]
    listen: String,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Respects RUST_LOG, defaults to info (or debug with --verbose).
    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("starting quill-server");
    info!("data root: {:?}", args.data);

    tokio::fs::create_dir_all(&args.data).await?;

    let server = Server::new(DirectoryStore::new(args.data));
    let listener = Server::bind(&args.listen).await?;

    tokio::select! {
        _ = server.run(listener) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down");
    Ok(())
}
