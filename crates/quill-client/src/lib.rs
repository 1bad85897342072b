//! quill-client: the note-taking client library.
//!
//! This crate provides everything between the interaction layer and the
//! wire:
//! - [`client::SyncClient`] — the persistent protocol connection
//! - [`worker::SyncHandle`] — command dispatch to the worker task owning it
//! - [`session::SessionStore`] — the persisted login identity
//! - [`credentials::CredentialStore`] — the external authentication seam
//! - [`controller`] — login/registration/logout and note operations

pub mod client;
pub mod controller;
pub mod credentials;
pub mod session;
pub mod worker;

pub use client::{SyncClient, SyncError};
pub use controller::{App, AppConfig, AppError, Workspace};
pub use credentials::{CredentialStore, FileCredentials, MemoryCredentials};
pub use session::SessionStore;
pub use worker::SyncHandle;
