//! quill-server library: exposes internal modules for testing.
//!
//! This is a thin library layer over the server components, allowing
//! integration tests to drive the store and listener directly.

pub mod connection;
pub mod server;
pub mod store;

pub use server::Server;
pub use store::DirectoryStore;
