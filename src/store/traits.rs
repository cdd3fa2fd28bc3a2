//! store::traits
//!
//! Virtual store trait definition.
//!
//! # Design
//!
//! Paths are `/`-separated virtual paths, normalized through
//! [`crate::core::paths`]. Every backend also reports the on-disk location
//! of a virtual path ([`VirtualStore::local_path`]), which is where the Git
//! engine opens repositories. Callers never branch on the backend.
//!
//! # Failure semantics
//!
//! - `read_file` / `stat` on a missing path fail with [`StoreError::NotFound`]
//! - reading, writing, or listing through a symbolic link fails with
//!   [`StoreError::SymbolicLink`]; `stat` reports the link itself
//! - every other failure is [`StoreError::Io`] with the cause attached

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;

use super::StoreError;

/// Kind of a store entry. A symbolic link is neither a file nor a
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStat {
    pub is_directory: bool,
    pub is_file: bool,
    pub is_symlink: bool,
    /// Regular file with an execute bit set (always false off Unix)
    pub is_executable: bool,
}

/// Addressable, hierarchical byte store the Git engine operates against.
#[async_trait]
pub trait VirtualStore: Send + Sync + Debug {
    /// Create a directory. With `recursive`, missing parents are created and
    /// an existing directory is not an error.
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), StoreError>;

    /// Read a file's full contents.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Create or truncate a file. The parent directory must exist.
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StoreError>;

    /// Entry names of a directory, sorted.
    async fn readdir(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Entry kind.
    async fn stat(&self, path: &str) -> Result<StoreStat, StoreError>;

    /// Add or clear a regular file's executable bits. A no-op where the
    /// platform has no file modes.
    async fn set_executable(&self, path: &str, executable: bool) -> Result<(), StoreError>;

    /// Remove a file.
    async fn unlink(&self, path: &str) -> Result<(), StoreError>;

    /// Remove a directory; with `recursive`, its contents too.
    async fn rmdir(&self, path: &str, recursive: bool) -> Result<(), StoreError>;

    /// On-disk location of a virtual path, as seen by the Git engine.
    fn local_path(&self, path: &str) -> Result<PathBuf, StoreError>;

    /// Check if a path exists.
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if a path is an existing directory.
    async fn is_dir(&self, path: &str) -> Result<bool, StoreError> {
        match self.stat(path).await {
            Ok(stat) => Ok(stat.is_directory),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
