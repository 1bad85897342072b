//! End-to-end tests: the full client stack against a real server.
//!
//! Each test gets its own server (random port, temp data root) and its own
//! client data directory, then drives login, snapshot pulls, note mutations
//! and logout through the controller layer.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quill_client::controller::{App, AppConfig, AppError};
use quill_client::credentials::MemoryCredentials;
use quill_client::SyncError;
use quill_core::vault::Vault;
use quill_server::server::Server;
use quill_server::store::DirectoryStore;
use tempfile::TempDir;
use tokio::net::TcpListener;

struct Harness {
    /// Keeps the temp dirs alive for the duration of the test.
    _server_dir: TempDir,
    _client_dir: TempDir,
    server_data: PathBuf,
    client_data: PathBuf,
    addr: SocketAddr,
}

impl Harness {
    async fn start() -> Self {
        let server_dir = TempDir::new().expect("failed to create server dir");
        let client_dir = TempDir::new().expect("failed to create client dir");
        let server_data = server_dir.path().join("data");

        let server = Server::new(DirectoryStore::new(server_data.clone()));
        let listener = Server::bind("127.0.0.1:0").await.expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get local addr");
        tokio::spawn(server.run(listener));

        Self {
            client_data: client_dir.path().to_path_buf(),
            _server_dir: server_dir,
            _client_dir: client_dir,
            server_data,
            addr,
        }
    }

    fn config(&self) -> AppConfig {
        AppConfig {
            server_addr: self.addr.to_string(),
            data_dir: self.client_data.clone(),
            request_timeout: Duration::from_secs(2),
        }
    }

    fn app(&self) -> App<MemoryCredentials> {
        App::new(self.config(), MemoryCredentials::with_user("alice", "pw"))
    }

    /// Write a note directly into the server's set for a user.
    async fn seed_server_note(&self, username: &str, name: &str, content: &str) {
        Vault::create(self.server_data.join(username))
            .await
            .unwrap()
            .write(name, content)
            .await
            .unwrap();
    }

    fn server_vault(&self, username: &str) -> Vault {
        Vault::new(self.server_data.join(username))
    }

    fn local_vault_dir(&self, username: &str) -> PathBuf {
        Vault::dir_for_user(Path::new(&self.client_data), username)
    }
}

// ============================================================================
// Login and snapshot pull
// ============================================================================

#[tokio::test]
async fn test_login_pulls_server_snapshot() {
    let harness = Harness::start().await;
    harness.seed_server_note("alice", "a", "hi").await;

    let app = harness.app();
    let workspace = app.login("alice", "pw").await.expect("login failed");

    assert!(workspace.is_synced());
    assert_eq!(workspace.notes().await.unwrap(), vec!["a"]);
    assert_eq!(workspace.read_note("a").await.unwrap(), "hi");
}

#[tokio::test]
async fn test_snapshot_preserves_local_extras() {
    let harness = Harness::start().await;
    harness.seed_server_note("alice", "remote", "from server").await;

    // A file already in the local vault that the server knows nothing about.
    Vault::create(harness.local_vault_dir("alice"))
        .await
        .unwrap()
        .write("local-only", "precious")
        .await
        .unwrap();

    let app = harness.app();
    let workspace = app.login("alice", "pw").await.expect("login failed");

    // Superset: both the server's file and the local extra survive.
    assert_eq!(workspace.notes().await.unwrap(), vec!["local-only", "remote"]);
    assert_eq!(workspace.read_note("local-only").await.unwrap(), "precious");
}

#[tokio::test]
async fn test_snapshot_remote_content_wins() {
    let harness = Harness::start().await;
    harness.seed_server_note("alice", "shared", "server version").await;

    Vault::create(harness.local_vault_dir("alice"))
        .await
        .unwrap()
        .write("shared", "stale local version")
        .await
        .unwrap();

    let app = harness.app();
    let workspace = app.login("alice", "pw").await.expect("login failed");

    assert_eq!(workspace.read_note("shared").await.unwrap(), "server version");
}

#[tokio::test]
async fn test_bad_credentials_change_nothing() {
    let harness = Harness::start().await;
    let app = harness.app();

    match app.login("alice", "wrong").await {
        Err(AppError::BadCredentials) => {}
        other => panic!("expected BadCredentials, got {:?}", other.err()),
    }
    match app.login("", "").await {
        Err(AppError::EmptyFields) => {}
        other => panic!("expected EmptyFields, got {:?}", other.err()),
    }

    // No session was saved and no vault was created.
    assert!(app.startup().await.unwrap().is_none());
    assert!(!harness.local_vault_dir("alice").exists());
}

// ============================================================================
// Note lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_reaches_server_and_survives_relogin() {
    let harness = Harness::start().await;
    let app = harness.app();

    let workspace = app.login("alice", "pw").await.unwrap();
    workspace.create_note("notes", "").await.unwrap();
    assert!(workspace.notes().await.unwrap().contains(&"notes".to_string()));

    workspace.save_note("notes", "remember this").await.unwrap();
    assert_eq!(
        harness.server_vault("alice").read("notes").await.unwrap(),
        "remember this"
    );

    // Logout wipes the vault...
    app.logout(workspace).await.unwrap();
    assert!(!harness.local_vault_dir("alice").exists());
    assert!(app.startup().await.unwrap().is_none());

    // ...and re-login repopulates it from the server.
    let workspace = app.login("alice", "pw").await.unwrap();
    assert_eq!(workspace.notes().await.unwrap(), vec!["notes"]);
    assert_eq!(workspace.read_note("notes").await.unwrap(), "remember this");
}

#[tokio::test]
async fn test_create_existing_note_is_application_error() {
    let harness = Harness::start().await;
    let app = harness.app();

    let workspace = app.login("alice", "pw").await.unwrap();
    workspace.create_note("todo", "x").await.unwrap();

    match workspace.create_note("todo", "y").await {
        Err(AppError::NoteExists(name)) => assert_eq!(name, "todo"),
        other => panic!("expected NoteExists, got {:?}", other.err()),
    }
    // Nothing changed, locally or remotely.
    assert_eq!(workspace.read_note("todo").await.unwrap(), "x");
    assert_eq!(harness.server_vault("alice").read("todo").await.unwrap(), "x");
}

#[tokio::test]
async fn test_delete_notes_removes_everywhere() {
    let harness = Harness::start().await;
    let app = harness.app();

    let workspace = app.login("alice", "pw").await.unwrap();
    workspace.create_note("a", "1").await.unwrap();
    workspace.create_note("b", "2").await.unwrap();
    workspace.create_note("keep", "3").await.unwrap();

    workspace
        .delete_notes(&["a".to_string(), "b".to_string()])
        .await
        .unwrap();

    assert_eq!(workspace.notes().await.unwrap(), vec!["keep"]);
    assert_eq!(harness.server_vault("alice").list().await.unwrap(), vec!["keep"]);
}

#[tokio::test]
async fn test_delete_note_is_idempotent() {
    let harness = Harness::start().await;
    let app = harness.app();

    let workspace = app.login("alice", "pw").await.unwrap();
    workspace.create_note("gone", "x").await.unwrap();

    workspace.delete_note("gone").await.unwrap();
    workspace.delete_note("gone").await.unwrap();
    assert!(workspace.notes().await.unwrap().is_empty());
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_provisions_and_logs_in() {
    let harness = Harness::start().await;
    let mut app = harness.app();

    let workspace = app
        .register("bob", "secret", "secret")
        .await
        .expect("registration failed");
    assert_eq!(workspace.username(), "bob");
    assert!(workspace.notes().await.unwrap().is_empty());

    // The side-channel provisioned the server-side set.
    let user_dir = harness.server_data.join("bob");
    for _ in 0..50 {
        if user_dir.is_dir() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(user_dir.is_dir(), "registration should provision a note set");

    // The session is remembered across restarts.
    let resumed = app.startup().await.unwrap().expect("session should resume");
    assert_eq!(resumed.username(), "bob");
}

#[tokio::test]
async fn test_register_validation() {
    let harness = Harness::start().await;
    let mut app = harness.app();

    assert!(matches!(
        app.register("bob", "one", "two").await.err(),
        Some(AppError::PasswordMismatch)
    ));
    assert!(matches!(
        app.register("alice", "pw", "pw").await.err(),
        Some(AppError::UsernameTaken)
    ));
    assert!(matches!(
        app.register("", "pw", "pw").await.err(),
        Some(AppError::EmptyFields)
    ));
    assert!(matches!(
        app.register("../evil", "pw", "pw").await.err(),
        Some(AppError::InvalidUsername(_))
    ));

    // None of the failures left a session behind.
    assert!(app.startup().await.unwrap().is_none());
}

// ============================================================================
// Degraded operation
// ============================================================================

#[tokio::test]
async fn test_offline_login_works_locally() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        // Nothing listens here; connection is refused immediately.
        server_addr: "127.0.0.1:1".into(),
        data_dir: dir.path().to_path_buf(),
        request_timeout: Duration::from_millis(500),
    };
    let app = App::new(config, MemoryCredentials::with_user("alice", "pw"));

    let workspace = app.login("alice", "pw").await.expect("login should succeed");
    assert!(!workspace.is_synced());

    // Local operations keep working without a server.
    workspace.create_note("draft", "offline text").await.unwrap();
    assert_eq!(workspace.read_note("draft").await.unwrap(), "offline text");
}

#[tokio::test]
async fn test_unresponsive_server_fails_request_but_keeps_local_state() {
    // A listener that accepts and then never answers anything.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            if let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        }
    });

    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        server_addr: addr.to_string(),
        data_dir: dir.path().to_path_buf(),
        request_timeout: Duration::from_millis(200),
    };
    let app = App::new(config, MemoryCredentials::with_user("alice", "pw"));

    // Login survives the failed snapshot pull (surfaced as a warning).
    let workspace = app.login("alice", "pw").await.expect("login should succeed");

    // The local deletes happen before the network call, so they stand even
    // though the server never acknowledges anything.
    let _ = workspace.create_note("f1", "1").await;
    let _ = workspace.create_note("f2", "2").await;
    let result = workspace
        .delete_notes(&["f1".to_string(), "f2".to_string()])
        .await;
    assert!(matches!(
        result.err(),
        Some(AppError::Sync(SyncError::Timeout | SyncError::NotConnected))
    ));
    assert!(workspace.notes().await.unwrap().is_empty());
}
