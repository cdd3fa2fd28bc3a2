//! store
//!
//! The virtual store the Git engine always reads and writes.
//!
//! # Architecture
//!
//! One trait, two backends selected by the embedding application:
//!
//! - [`SandboxStore`]: confined to a private root, usable without any
//!   host permission
//! - [`PassThroughStore`]: real paths, for runtimes that already have
//!   unrestricted file access
//!
//! Nothing else in the crate knows which backend is active.

mod disk;
mod passthrough;
mod sandbox;
mod traits;

pub use passthrough::PassThroughStore;
pub use sandbox::SandboxStore;
pub use traits::{StoreStat, VirtualStore};

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Path does not exist (only from `read_file` and `stat`).
    #[error("no such file or directory: {path}")]
    NotFound { path: String },

    /// Path resolves outside the store root.
    #[error("path escapes the store root: {path}")]
    OutsideRoot { path: String },

    /// Path is, or passes through, a symbolic link.
    #[error("refusing to follow symbolic link: {path}")]
    SymbolicLink { path: String },

    /// Any other failure, with the underlying cause.
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classification in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::OutsideRoot { .. } | StoreError::SymbolicLink { .. } => {
                ErrorKind::PermissionDenied
            }
            StoreError::Io { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ErrorKind::PermissionDenied
            }
            StoreError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether the failure is an `AlreadyExists` I/O error.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let nf = StoreError::NotFound { path: "/x".into() };
        assert_eq!(nf.kind(), ErrorKind::NotFound);

        let denied = StoreError::Io {
            path: "/x".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.kind(), ErrorKind::PermissionDenied);

        let exists = StoreError::Io {
            path: "/x".into(),
            source: std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        };
        assert_eq!(exists.kind(), ErrorKind::Io);
        assert!(exists.is_already_exists());
    }

    #[test]
    fn display_includes_path() {
        let err = StoreError::OutsideRoot {
            path: "../x".into(),
        };
        assert!(err.to_string().contains("../x"));
    }
}
