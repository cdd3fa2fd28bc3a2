//! git
//!
//! The only doorway to the Git engine.
//!
//! # Architecture
//!
//! No other module imports `git2`. Every operation here:
//!
//! - takes repository locations as virtual store paths and maps them to
//!   disk through [`VirtualStore::local_path`](crate::store::VirtualStore::local_path)
//! - runs the blocking engine call on tokio's blocking pool, opening the
//!   repository inside the task (`git2::Repository` is not `Sync`)
//! - normalizes failures into [`GitError`], whose [`kind`](GitError::kind)
//!   is one of the crate-wide [`ErrorKind`] classes
//!
//! Network operations go through [`transport`], which owns the credential
//! callback, cancellation, timeouts, and raw transport error
//! reclassification.
//!
//! # Example
//!
//! ```ignore
//! use gitbridge::git::{RepositoryClient, TransportOptions};
//!
//! let client = RepositoryClient::new(store, config);
//! client.init("/repo", true).await?;
//! for commit in client.log("/repo", 10).await? {
//!     println!("{} {}", commit.oid.short(7), commit.summary());
//! }
//! ```

mod client;
pub mod transport;

pub use client::{PullOutcome, RepositoryClient};
pub use transport::{CancelToken, TransportOptions};

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::TypeError;
use crate::error::ErrorKind;
use crate::store::StoreError;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository at the given location.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// Ref, branch, remote, or remote repository does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Remote rejected the credentials, or none were available.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Remote refused the update (e.g. push rejected).
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Connection, DNS, TLS, or HTTP transport failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Request blocked by a cross-origin policy.
    #[error("request blocked by CORS policy: {message}")]
    CorsBlocked { message: String },

    /// The transport deadline passed.
    #[error("operation timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    /// Cancelled through a [`CancelToken`].
    #[error("operation cancelled")]
    Cancelled,

    /// Merge or checkout would conflict with existing content.
    #[error("conflict in {}", .paths.join(", "))]
    Conflict { paths: Vec<String> },

    /// Malformed argument.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unclassified engine or transport failure.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Classification in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitError::NotARepo { .. } | GitError::NotFound { .. } => ErrorKind::NotFound,
            GitError::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
            GitError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            GitError::Network { .. } | GitError::TimedOut { .. } => ErrorKind::NetworkError,
            GitError::CorsBlocked { .. } => ErrorKind::CorsBlocked,
            GitError::Cancelled => ErrorKind::Cancelled,
            GitError::Conflict { .. } => ErrorKind::Conflict,
            GitError::InvalidInput { .. } => ErrorKind::InvalidInput,
            GitError::Store(e) => e.kind(),
            GitError::Internal { .. } => ErrorKind::Unknown,
        }
    }

    /// Map a local (non-transport) engine error, naming what was looked up.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => GitError::NotFound {
                what: context.to_string(),
            },
            git2::ErrorCode::Conflict | git2::ErrorCode::MergeConflict => GitError::Conflict {
                paths: vec![context.to_string()],
            },
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Invalid => GitError::InvalidInput {
                message: format!("{}: {}", context, err.message()),
            },
            git2::ErrorCode::Locked => GitError::Internal {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidInput {
            message: err.to_string(),
        }
    }
}
