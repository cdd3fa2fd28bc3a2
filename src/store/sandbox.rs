//! store::sandbox
//!
//! Confined store rooted in a private directory.
//!
//! # Security
//!
//! - Virtual paths are normalized before mapping; `..` cannot climb above
//!   the sandbox root
//! - Relative paths that still start with `..` are rejected with
//!   [`StoreError::OutsideRoot`]
//! - Symbolic links inside the sandbox (a cloned repository may contain
//!   them) are never followed, at the leaf or in a parent directory
//! - Each [`SandboxStore::ephemeral`] call gets a fresh namespace, so
//!   separate facades never share files
//!
//! # Example
//!
//! ```ignore
//! use gitbridge::store::{SandboxStore, VirtualStore};
//!
//! let store = SandboxStore::ephemeral()?;
//! store.mkdir("/repo", true).await?;
//! store.write_file("/repo/README.md", b"# hi\n").await?;
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{disk, StoreError, StoreStat, VirtualStore};
use crate::core::paths;

/// Store confined to a private root directory.
#[derive(Debug, Clone)]
pub struct SandboxStore {
    root: PathBuf,
}

impl SandboxStore {
    /// Create a sandbox rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StoreError::Io {
            path: root.display().to_string(),
            source: e,
        })?;
        Ok(Self { root })
    }

    /// Create a sandbox in a fresh, uniquely named namespace under the
    /// platform data directory (falling back to the temp directory).
    pub fn ephemeral() -> Result<Self, StoreError> {
        let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
        let namespace = uuid::Uuid::new_v4().to_string();
        Self::new(base.join("gitbridge").join("sandboxes").join(namespace))
    }

    /// The private root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `path` to disk, refusing it when a parent directory inside the
    /// sandbox is a symbolic link.
    async fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let local = self.local_path(path)?;
        disk::refuse_linked_parents(path, &self.root, &local).await?;
        Ok(local)
    }

    /// Delete the whole sandbox from disk.
    pub async fn purge(self) -> Result<(), StoreError> {
        tokio::fs::remove_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::Io {
                path: "/".to_string(),
                source: e,
            })
    }
}

#[async_trait]
impl VirtualStore for SandboxStore {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), StoreError> {
        disk::mkdir(path, &self.resolve(path).await?, recursive).await
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        disk::read_file(path, &self.resolve(path).await?).await
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StoreError> {
        disk::write_file(path, &self.resolve(path).await?, content).await
    }

    async fn readdir(&self, path: &str) -> Result<Vec<String>, StoreError> {
        disk::readdir(path, &self.resolve(path).await?).await
    }

    async fn stat(&self, path: &str) -> Result<StoreStat, StoreError> {
        disk::stat(path, &self.resolve(path).await?).await
    }

    async fn set_executable(&self, path: &str, executable: bool) -> Result<(), StoreError> {
        disk::set_executable(path, &self.resolve(path).await?, executable).await
    }

    async fn unlink(&self, path: &str) -> Result<(), StoreError> {
        disk::unlink(path, &self.resolve(path).await?).await
    }

    async fn rmdir(&self, path: &str, recursive: bool) -> Result<(), StoreError> {
        let local = self.resolve(path).await?;
        if local == self.root {
            return Err(StoreError::OutsideRoot {
                path: path.to_string(),
            });
        }
        disk::rmdir(path, &local, recursive).await
    }

    fn local_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        let normalized = paths::normalize(path);
        let segments = paths::segments(&normalized);
        if segments.first() == Some(&"..") {
            return Err(StoreError::OutsideRoot {
                path: path.to_string(),
            });
        }
        Ok(segments
            .into_iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }
}
