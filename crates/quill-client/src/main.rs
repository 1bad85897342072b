//! quill: personal notes with central sync.
//!
//! Thin command-line surface over the controller layer. The session
//! persists across invocations, so `quill login` once, then work with
//! `list`/`show`/`new`/`save`/`rm` until `quill logout`.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use quill_client::controller::{App, AppConfig, Workspace};
use quill_client::credentials::{CredentialStore, FileCredentials};

#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Personal notes with central sync")]
struct Args {
    /// Sync server address
    #[arg(short, long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Directory holding vaults, session and credentials
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in
    Register {
        username: String,
        password: String,
        /// Password confirmation (defaults to the password itself)
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Log in and pull the server snapshot
    Login { username: String, password: String },
    /// Log out and remove the local vault
    Logout,
    /// List notes
    List,
    /// Print a note
    Show { name: String },
    /// Create a new note
    New {
        name: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Replace a note's content
    Save { name: String, content: String },
    /// Delete one or more notes
    Rm { names: Vec<String> },
    /// Pull the latest server snapshot
    Sync,
    /// Print the logged-in username
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig {
        server_addr: args.server,
        data_dir: args.data_dir.clone(),
        request_timeout: Duration::from_secs(args.timeout),
    };
    let credentials = FileCredentials::open(args.data_dir.join("users.json"))?;
    let mut app = App::new(config, credentials);

    match args.command {
        Command::Register {
            username,
            password,
            confirm,
        } => {
            let confirm = confirm.unwrap_or_else(|| password.clone());
            let workspace = app.register(&username, &password, &confirm).await?;
            println!("Registered and logged in as {}", workspace.username());
        }
        Command::Login { username, password } => {
            let workspace = app.login(&username, &password).await?;
            let count = workspace.notes().await?.len();
            println!("Logged in as {} ({count} notes)", workspace.username());
        }
        Command::Logout => {
            let workspace = require_session(&app).await?;
            app.logout(workspace).await?;
            println!("Logged out");
        }
        Command::List => {
            let workspace = require_session(&app).await?;
            for name in workspace.notes().await? {
                println!("{name}");
            }
        }
        Command::Show { name } => {
            let workspace = require_session(&app).await?;
            print!("{}", workspace.read_note(&name).await?);
        }
        Command::New { name, content } => {
            let workspace = require_session(&app).await?;
            workspace.create_note(&name, &content).await?;
            println!("Created {name}");
        }
        Command::Save { name, content } => {
            let workspace = require_session(&app).await?;
            workspace.save_note(&name, &content).await?;
            println!("Saved {name}");
        }
        Command::Rm { names } => {
            if names.is_empty() {
                bail!("nothing to delete");
            }
            let workspace = require_session(&app).await?;
            workspace.delete_notes(&names).await?;
            println!("Deleted {} note(s)", names.len());
        }
        Command::Sync => {
            let mut workspace = require_session(&app).await?;
            let count = workspace.pull_snapshot().await?;
            println!("Pulled {count} note(s)");
        }
        Command::Whoami => {
            let workspace = require_session(&app).await?;
            println!("{}", workspace.username());
        }
    }

    Ok(())
}

async fn require_session<C: CredentialStore>(app: &App<C>) -> Result<Workspace> {
    match app.startup().await? {
        Some(workspace) => Ok(workspace),
        None => bail!("not logged in (try `quill login <user> <password>`)"),
    }
}
