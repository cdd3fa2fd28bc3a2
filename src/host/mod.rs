//! host
//!
//! Host directory handles: opaque, permission-scoped capabilities for a
//! real directory tree granted by the surrounding application.
//!
//! # Design
//!
//! A handle is navigated by name only. Nothing here ever exposes an
//! absolute filesystem path, so callers cannot assume one exists.
//!
//! - [`HostDirectory`]: list entries, open, create, or remove children
//! - [`HostFile`]: read all bytes, open for write
//! - [`HostWritable`]: buffered writer; content becomes visible on `close`
//!
//! Symbolic links are listed as [`EntryKind::Symlink`] and never opened:
//! a handle cannot be used to reach outside the granted tree.
//!
//! Implementations:
//!
//! - [`FsHostDirectory`]: a user-granted directory on the local disk
//! - [`MemoryHostDirectory`]: in-memory tree for embedders and tests

mod fs;
mod memory;

pub use fs::FsHostDirectory;
pub use memory::MemoryHostDirectory;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors from host handle operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// Entry does not exist and creation was not requested.
    #[error("host entry not found: {name}")]
    NotFound { name: String },

    /// Entry exists but is the wrong kind (file vs directory).
    #[error("host entry '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: EntryKind },

    /// The host refused access.
    #[error("permission denied for host entry: {name}")]
    PermissionDenied { name: String },

    /// Directory still has children and cannot be removed.
    #[error("host directory '{name}' is not empty")]
    NotEmpty { name: String },

    /// Name is empty, `.`/`..`, or contains a separator.
    #[error("invalid host entry name: '{name}'")]
    InvalidName { name: String },

    /// Writer used after `close`.
    #[error("writer for '{name}' is already closed")]
    Closed { name: String },

    /// Other I/O failure.
    #[error("host I/O error for '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl HostError {
    /// Classification in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::NotFound { .. } => ErrorKind::NotFound,
            HostError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            HostError::InvalidName { .. } => ErrorKind::InvalidInput,
            HostError::TypeMismatch { .. }
            | HostError::NotEmpty { .. }
            | HostError::Closed { .. }
            | HostError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Kind of a host entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    /// Listed but never followed
    Symlink,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => f.write_str("file"),
            EntryKind::Directory => f.write_str("directory"),
            EntryKind::Symlink => f.write_str("symbolic link"),
        }
    }
}

/// A named child of a host directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// A directory capability.
#[async_trait]
pub trait HostDirectory: Send + Sync + Debug {
    /// This directory's own name.
    fn name(&self) -> &str;

    /// Direct children, sorted by name.
    async fn list_entries(&self) -> Result<Vec<HostEntry>, HostError>;

    /// Open a child directory, optionally creating it.
    async fn get_subdirectory(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn HostDirectory>, HostError>;

    /// Open a child file, optionally creating it empty.
    async fn get_file(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn HostFile>, HostError>;

    /// Remove a child file, or a child directory that is empty.
    ///
    /// # Errors
    ///
    /// - [`HostError::NotFound`] if there is no such child
    /// - [`HostError::NotEmpty`] if the directory has children
    async fn remove_entry(&self, name: &str) -> Result<(), HostError>;
}

/// A file capability.
#[async_trait]
pub trait HostFile: Send + Sync + Debug {
    /// This file's own name.
    fn name(&self) -> &str;

    /// Full contents.
    async fn read_all_bytes(&self) -> Result<Vec<u8>, HostError>;

    /// Start replacing the contents.
    async fn open_for_write(&self) -> Result<Box<dyn HostWritable>, HostError>;

    /// Whether the file carries an execute permission. Hosts without file
    /// modes report `false`.
    async fn is_executable(&self) -> Result<bool, HostError> {
        Ok(false)
    }
}

/// Writer returned by [`HostFile::open_for_write`].
///
/// Bytes are buffered; the file holds the new contents only after `close`.
#[async_trait]
pub trait HostWritable: Send {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), HostError>;

    /// Give the file execute permission on `close`. Hosts without file modes
    /// ignore it.
    fn set_executable(&mut self) {}

    async fn close(&mut self) -> Result<(), HostError>;
}

/// Replace a file's contents in one call.
pub async fn write_all(file: &dyn HostFile, bytes: &[u8]) -> Result<(), HostError> {
    write_with_mode(file, bytes, false).await
}

/// Replace a file's contents, marking it executable when `executable`.
/// Existing permissions are otherwise kept.
pub async fn write_with_mode(
    file: &dyn HostFile,
    bytes: &[u8],
    executable: bool,
) -> Result<(), HostError> {
    let mut writer = file.open_for_write().await?;
    if executable {
        writer.set_executable();
    }
    writer.write(bytes).await?;
    writer.close().await
}

/// Reject names that would navigate instead of naming a child.
pub(crate) fn validate_name(name: &str) -> Result<(), HostError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(HostError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_names() {
        assert!(validate_name("README.md").is_ok());
        assert!(validate_name(".git").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(validate_name(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            HostError::NotFound { name: "x".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            HostError::PermissionDenied { name: "x".into() }.kind(),
            ErrorKind::PermissionDenied
        );
        let mismatch = HostError::TypeMismatch {
            name: "x".into(),
            expected: EntryKind::Directory,
        };
        assert!(mismatch.to_string().contains("not a directory"));
        assert_eq!(
            HostError::NotEmpty { name: "d".into() }.kind(),
            ErrorKind::Io
        );
        assert_eq!(EntryKind::Symlink.to_string(), "symbolic link");
    }
}
