//! error
//!
//! Crate-wide error classification and the facade error shape.
//!
//! Every layer keeps its own `thiserror` enum ([`StoreError`], [`HostError`],
//! [`MirrorError`], [`GitError`], [`CredentialError`]) and maps it onto
//! [`ErrorKind`] through a `kind()` method. [`SyncError`] wraps any of them
//! together with the name of the facade operation that failed, so callers
//! always see one shape.

use serde::Serialize;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::git::GitError;
use crate::host::HostError;
use crate::mirror::MirrorError;
use crate::store::StoreError;

/// Recoverable failure classes. Each implies a different remedy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Path, repository, ref, or remote absent.
    NotFound,
    /// Remote rejected the credentials (or none were available).
    AuthenticationFailed,
    /// Push rejected, write-protected host entry, or sandbox escape.
    PermissionDenied,
    /// Connection, DNS, TLS, or timeout failure.
    NetworkError,
    /// Request blocked by a cross-origin policy. A network error subclass.
    CorsBlocked,
    /// Operation attempted before `open`, `clone`, or `init`.
    NoRepositoryBound,
    /// Store-level read/write failure.
    Io,
    /// Operation cancelled by the caller.
    Cancelled,
    /// Merge produced conflicts.
    Conflict,
    /// Malformed argument (branch name, template, entry name).
    InvalidInput,
    /// Unclassified transport or engine failure.
    Unknown,
}

impl ErrorKind {
    /// Whether this is a network failure, including CORS.
    pub fn is_network(self) -> bool {
        matches!(self, ErrorKind::NetworkError | ErrorKind::CorsBlocked)
    }

    /// Stable identifier, as used in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::CorsBlocked => "cors_blocked",
            ErrorKind::NoRepositoryBound => "no_repository_bound",
            ErrorKind::Io => "io",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every [`crate::sync::GitSync`] operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No current repository handle.
    #[error("{operation}: no repository is open (use open, clone or init first)")]
    NoRepositoryBound { operation: &'static str },

    /// Path argument outside the current repository.
    #[error("{operation}: '{path}' is outside the repository")]
    InvalidPath {
        operation: &'static str,
        path: String,
    },

    #[error("{operation} failed: {source}")]
    Git {
        operation: &'static str,
        #[source]
        source: GitError,
    },

    #[error("{operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{operation} failed: {source}")]
    Mirror {
        operation: &'static str,
        #[source]
        source: MirrorError,
    },

    #[error("{operation} failed: {source}")]
    Host {
        operation: &'static str,
        #[source]
        source: HostError,
    },

    #[error("{operation} failed: {source}")]
    Credential {
        operation: &'static str,
        #[source]
        source: CredentialError,
    },
}

impl SyncError {
    /// Name of the facade operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            SyncError::NoRepositoryBound { operation }
            | SyncError::InvalidPath { operation, .. }
            | SyncError::Git { operation, .. }
            | SyncError::Store { operation, .. }
            | SyncError::Mirror { operation, .. }
            | SyncError::Host { operation, .. }
            | SyncError::Credential { operation, .. } => *operation,
        }
    }

    /// Classification of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::NoRepositoryBound { .. } => ErrorKind::NoRepositoryBound,
            SyncError::InvalidPath { .. } => ErrorKind::InvalidInput,
            SyncError::Git { source, .. } => source.kind(),
            SyncError::Store { source, .. } => source.kind(),
            SyncError::Mirror { source, .. } => source.kind(),
            SyncError::Host { source, .. } => source.kind(),
            SyncError::Credential { source, .. } => source.kind(),
        }
    }

    pub(crate) fn git(operation: &'static str) -> impl FnOnce(GitError) -> SyncError {
        move |source| SyncError::Git { operation, source }
    }

    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> SyncError {
        move |source| SyncError::Store { operation, source }
    }

    pub(crate) fn mirror(operation: &'static str) -> impl FnOnce(MirrorError) -> SyncError {
        move |source| SyncError::Mirror { operation, source }
    }

    pub(crate) fn host(operation: &'static str) -> impl FnOnce(HostError) -> SyncError {
        move |source| SyncError::Host { operation, source }
    }

    pub(crate) fn credential(
        operation: &'static str,
    ) -> impl FnOnce(CredentialError) -> SyncError {
        move |source| SyncError::Credential { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_classes() {
        assert!(ErrorKind::NetworkError.is_network());
        assert!(ErrorKind::CorsBlocked.is_network());
        assert!(!ErrorKind::AuthenticationFailed.is_network());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::AuthenticationFailed).unwrap();
        assert_eq!(json, "\"authentication_failed\"");
        assert_eq!(ErrorKind::NoRepositoryBound.to_string(), "no_repository_bound");
    }

    #[test]
    fn sync_error_carries_operation() {
        let err = SyncError::NoRepositoryBound { operation: "status" };
        assert_eq!(err.operation(), "status");
        assert_eq!(err.kind(), ErrorKind::NoRepositoryBound);
        assert!(err.to_string().starts_with("status:"));

        let err = SyncError::store("read_file")(StoreError::NotFound {
            path: "/repo/x".into(),
        });
        assert_eq!(err.operation(), "read_file");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("/repo/x"));
    }
}
