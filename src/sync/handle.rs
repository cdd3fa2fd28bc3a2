//! sync::handle
//!
//! The current repository record and mirror outcomes.

use std::sync::Arc;

use serde::Serialize;

use crate::core::paths;
use crate::error::{ErrorKind, SyncError};
use crate::host::HostDirectory;
use crate::mirror::MirrorReport;

/// Which virtual store path is the current repository, and where it is
/// mirrored.
#[derive(Debug, Clone)]
pub struct RepoHandle {
    /// Repository root in the virtual store
    pub root_path: String,
    /// Host directory mirrored after writes, if any
    pub host: Option<Arc<dyn HostDirectory>>,
    /// Subdirectory of `host` holding the repository (set after a clone
    /// into a host parent directory)
    pub host_segment: Option<String>,
    /// URL of the configured remote, when known
    pub remote: Option<String>,
}

impl RepoHandle {
    pub fn new(root_path: impl AsRef<str>) -> Self {
        Self {
            root_path: paths::normalize(root_path.as_ref()),
            host: None,
            host_segment: None,
            remote: None,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.host.is_some()
    }

    /// Map a repository path (relative, or absolute inside the root) to
    /// `(store path, root-relative path)`.
    pub(crate) fn resolve(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<(String, String), SyncError> {
        let full = if paths::is_absolute(path) {
            paths::normalize(path)
        } else {
            paths::join(&[self.root_path.as_str(), path])
        };
        let rel = paths::relative(&self.root_path, &full);
        if rel.is_empty() || paths::segments(&rel).first() == Some(&"..") {
            return Err(SyncError::InvalidPath {
                operation,
                path: path.to_string(),
            });
        }
        Ok((full, rel))
    }
}

/// Outcome of the host mirroring that follows an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MirrorStatus {
    /// No host directory is bound; nothing to mirror.
    #[default]
    NotBound,
    /// Mirroring ran; the report lists anything skipped.
    Mirrored(MirrorReport),
    /// Mirroring failed. The store change itself succeeded.
    Failed { kind: ErrorKind, message: String },
}

impl MirrorStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, MirrorStatus::Failed { .. })
    }
}
