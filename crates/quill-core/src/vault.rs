//! Vault: one directory of note files, shared by client and server.
//!
//! The client keeps a `vault_<username>` directory per logged-in user; the
//! server keeps one directory per username under its data root. Both go
//! through this store so filename normalization behaves identically on each
//! side: notes are stored with the `.txt` suffix and displayed without it.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Suffix every stored note carries on disk and on the wire.
pub const NOTE_SUFFIX: &str = ".txt";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("note not found: {0}")]
    NotFound(String),

    #[error("invalid note name: {0:?}")]
    InvalidName(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VaultError>;

/// Append the note suffix unless already present. Idempotent.
pub fn normalize(name: &str) -> String {
    if name.ends_with(NOTE_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{NOTE_SUFFIX}")
    }
}

/// Strip the note suffix for display. Inverse of [`normalize`] for any
/// unsuffixed name.
pub fn display(name: &str) -> &str {
    name.strip_suffix(NOTE_SUFFIX).unwrap_or(name)
}

/// Check that a name is a safe, single path component.
///
/// Usernames and filenames both cross the trust boundary as presented, so
/// anything that could escape its directory is rejected before it reaches
/// the filesystem.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// A directory of note files.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Wrap an existing (or soon to be created) vault directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open a vault, creating its directory if needed.
    pub async fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let vault = Self::new(root);
        fs::create_dir_all(&vault.root).await?;
        Ok(vault)
    }

    /// The deterministic vault directory for a username.
    pub fn dir_for_user(base: &Path, username: &str) -> PathBuf {
        base.join(format!("vault_{username}"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a display or normalized name to its on-disk path.
    fn note_path(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_name(name) {
            return Err(VaultError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(normalize(name)))
    }

    /// Sorted display names of every note in the vault.
    ///
    /// A missing vault directory lists as empty rather than erroring: the
    /// server uses this for usernames it has never seen.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(NOTE_SUFFIX) {
                continue;
            }
            if entry.file_type().await?.is_file() {
                names.push(display(&name).to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn read(&self, name: &str) -> Result<String> {
        let path = self.note_path(name)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(VaultError::NotFound(display(name).to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create-or-replace a note.
    pub async fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.note_path(name)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, content).await?;
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.note_path(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Delete a note. Idempotent: absence is not an error.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = self.note_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the vault directory and everything in it.
    ///
    /// Only flat note files are expected, but nested entries are handled by
    /// the recursive remove. A vault that is already gone is fine;
    /// permission or symlink trouble surfaces as a recoverable error.
    pub async fn purge(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!(root = %self.root.display(), "vault purged");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault(dir: &TempDir) -> Vault {
        Vault::new(dir.path().join("notes"))
    }

    // ==================== Name handling ====================

    #[test]
    fn test_normalize_is_idempotent() {
        assert_eq!(normalize("todo"), "todo.txt");
        assert_eq!(normalize(&normalize("todo")), "todo.txt");
        assert_eq!(normalize("todo.txt"), "todo.txt");
    }

    #[test]
    fn test_display_inverts_normalize() {
        assert_eq!(display(&normalize("todo")), "todo");
        assert_eq!(display("todo.txt"), "todo");
        assert_eq!(display("todo"), "todo");
        // A note legitimately named "notes.txt" normalizes to itself.
        assert_eq!(display(&normalize("notes.txt")), "notes");
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("todo"));
        assert!(is_valid_name("shopping list"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("."));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name("../escape"));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name("a\\b"));
    }

    // ==================== Store operations ====================

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        vault.write("todo", "buy milk").await.unwrap();
        assert_eq!(vault.read("todo").await.unwrap(), "buy milk");
        // Same note, normalized name.
        assert_eq!(vault.read("todo.txt").await.unwrap(), "buy milk");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        match vault.read("ghost").await {
            Err(VaultError::NotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_is_sorted_display_names() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        vault.write("zebra", "").await.unwrap();
        vault.write("apple", "").await.unwrap();
        vault.write("mango", "").await.unwrap();

        assert_eq!(vault.list().await.unwrap(), vec!["apple", "mango", "zebra"]);
    }

    #[tokio::test]
    async fn test_list_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        vault.write("real", "").await.unwrap();
        std::fs::write(vault.root().join("stray.md"), "x").unwrap();

        assert_eq!(vault.list().await.unwrap(), vec!["real"]);
    }

    #[tokio::test]
    async fn test_list_missing_vault_is_empty() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);
        assert!(vault.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        vault.write("todo", "v1").await.unwrap();
        vault.write("todo", "v2").await.unwrap();
        assert_eq!(vault.read("todo").await.unwrap(), "v2");
        assert_eq!(vault.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        vault.write("todo", "x").await.unwrap();
        vault.delete("todo").await.unwrap();
        assert!(!vault.list().await.unwrap().contains(&"todo".to_string()));
        // Second delete is a no-op.
        vault.delete("todo").await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_names_rejected_before_fs() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        assert!(matches!(
            vault.write("../outside", "x").await,
            Err(VaultError::InvalidName(_))
        ));
        assert!(matches!(
            vault.read("a/b").await,
            Err(VaultError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_removes_everything() {
        let dir = TempDir::new().unwrap();
        let vault = vault(&dir);

        vault.write("a", "1").await.unwrap();
        vault.write("b", "2").await.unwrap();
        // Nested entry, defensively.
        std::fs::create_dir_all(vault.root().join("nested")).unwrap();
        std::fs::write(vault.root().join("nested/deep.txt"), "x").unwrap();

        vault.purge().await.unwrap();
        assert!(!vault.root().exists());

        // Purging an already-absent vault is fine.
        vault.purge().await.unwrap();
    }
}
