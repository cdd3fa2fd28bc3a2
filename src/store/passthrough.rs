//! store::passthrough
//!
//! Store that operates directly on the real filesystem.
//!
//! Used when the runtime already has unrestricted file access. Absolute
//! virtual paths are real paths; relative ones resolve against the base
//! directory chosen at construction. No confinement is applied.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{disk, StoreError, StoreStat, VirtualStore};
use crate::core::paths;

/// Pass-through store over the host filesystem.
#[derive(Debug, Clone)]
pub struct PassThroughStore {
    base: PathBuf,
}

impl PassThroughStore {
    /// Resolve relative paths against the current working directory.
    pub fn new() -> Self {
        Self::with_base(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Resolve relative paths against `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Base directory for relative paths.
    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl Default for PassThroughStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VirtualStore for PassThroughStore {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), StoreError> {
        disk::mkdir(path, &self.local_path(path)?, recursive).await
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        disk::read_file(path, &self.local_path(path)?).await
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StoreError> {
        disk::write_file(path, &self.local_path(path)?, content).await
    }

    async fn readdir(&self, path: &str) -> Result<Vec<String>, StoreError> {
        disk::readdir(path, &self.local_path(path)?).await
    }

    async fn stat(&self, path: &str) -> Result<StoreStat, StoreError> {
        disk::stat(path, &self.local_path(path)?).await
    }

    async fn set_executable(&self, path: &str, executable: bool) -> Result<(), StoreError> {
        disk::set_executable(path, &self.local_path(path)?, executable).await
    }

    async fn unlink(&self, path: &str) -> Result<(), StoreError> {
        disk::unlink(path, &self.local_path(path)?).await
    }

    async fn rmdir(&self, path: &str, recursive: bool) -> Result<(), StoreError> {
        disk::rmdir(path, &self.local_path(path)?, recursive).await
    }

    fn local_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        let normalized = paths::normalize(path);
        if paths::is_absolute(&normalized) {
            Ok(PathBuf::from(normalized))
        } else {
            Ok(self.base.join(normalized))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absolute_paths_pass_through() {
        let store = PassThroughStore::with_base("/base");
        assert_eq!(store.local_path("/srv//x").unwrap(), PathBuf::from("/srv/x"));
        assert_eq!(store.local_path("rel/y").unwrap(), PathBuf::from("/base/rel/y"));
    }

    #[tokio::test]
    async fn operates_on_real_files() {
        let dir = TempDir::new().unwrap();
        let store = PassThroughStore::with_base(dir.path());

        store.mkdir("proj", false).await.unwrap();
        store.write_file("proj/a.md", b"# a").await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("proj/a.md")).unwrap(), b"# a");
        assert_eq!(store.readdir("proj").await.unwrap(), vec!["a.md"]);
        assert!(matches!(
            store.read_file("proj/missing").await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
