//! host::fs
//!
//! Host handle over a user-granted directory on the local disk.
//!
//! Writes are atomic: bytes go to a temp sibling, which is renamed over the
//! target on `close`. The target's permissions carry over to the new file.
//!
//! Entries are inspected with `symlink_metadata`, so a symbolic link is
//! listed as one and refused by `get_subdirectory` and `get_file`.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;

use super::{
    validate_name, EntryKind, HostDirectory, HostEntry, HostError, HostFile, HostWritable,
};

fn map_io(name: &str, source: std::io::Error) -> HostError {
    match source.kind() {
        IoErrorKind::NotFound => HostError::NotFound {
            name: name.to_string(),
        },
        IoErrorKind::PermissionDenied => HostError::PermissionDenied {
            name: name.to_string(),
        },
        _ => HostError::Io {
            name: name.to_string(),
            source,
        },
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A granted directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsHostDirectory {
    path: PathBuf,
    name: String,
}

impl FsHostDirectory {
    /// Wrap an existing directory.
    ///
    /// # Errors
    ///
    /// - [`HostError::NotFound`] if the path does not exist
    /// - [`HostError::TypeMismatch`] if it is not a directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HostError> {
        let path = path.into();
        let name = display_name(&path);
        let meta = std::fs::metadata(&path).map_err(|e| map_io(&name, e))?;
        if !meta.is_dir() {
            return Err(HostError::TypeMismatch {
                name,
                expected: EntryKind::Directory,
            });
        }
        Ok(Self { path, name })
    }

    /// Shared-handle form used by the mirror and facade.
    pub fn open_shared(path: impl Into<PathBuf>) -> Result<Arc<dyn HostDirectory>, HostError> {
        Ok(Arc::new(Self::open(path)?))
    }
}

#[async_trait]
impl HostDirectory for FsHostDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_entries(&self) -> Result<Vec<HostEntry>, HostError> {
        let mut reader = fs::read_dir(&self.path)
            .await
            .map_err(|e| map_io(&self.name, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| map_io(&self.name, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            // special files are skipped
            let kind = match fs::symlink_metadata(entry.path()).await {
                Ok(meta) if meta.file_type().is_symlink() => EntryKind::Symlink,
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                Ok(meta) if meta.is_file() => EntryKind::File,
                _ => continue,
            };
            entries.push(HostEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn get_subdirectory(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn HostDirectory>, HostError> {
        validate_name(name)?;
        let path = self.path.join(name);

        match fs::symlink_metadata(&path).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(HostError::TypeMismatch {
                    name: name.to_string(),
                    expected: EntryKind::Directory,
                })
            }
            Err(e) if e.kind() == IoErrorKind::NotFound && create_if_missing => {
                match fs::create_dir(&path).await {
                    Ok(()) => {}
                    // lost a race with a concurrent creator
                    Err(e) if e.kind() == IoErrorKind::AlreadyExists => {}
                    Err(e) => return Err(map_io(name, e)),
                }
            }
            Err(e) => return Err(map_io(name, e)),
        }

        Ok(Arc::new(FsHostDirectory {
            path,
            name: name.to_string(),
        }))
    }

    async fn get_file(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> Result<Arc<dyn HostFile>, HostError> {
        validate_name(name)?;
        let path = self.path.join(name);

        match fs::symlink_metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(HostError::TypeMismatch {
                    name: name.to_string(),
                    expected: EntryKind::File,
                })
            }
            Err(e) if e.kind() == IoErrorKind::NotFound && create_if_missing => {
                fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&path)
                    .await
                    .map_err(|e| map_io(name, e))?;
            }
            Err(e) => return Err(map_io(name, e)),
        }

        Ok(Arc::new(FsHostFile {
            path,
            name: name.to_string(),
        }))
    }

    async fn remove_entry(&self, name: &str) -> Result<(), HostError> {
        validate_name(name)?;
        let path = self.path.join(name);
        let meta = fs::symlink_metadata(&path)
            .await
            .map_err(|e| map_io(name, e))?;

        if meta.is_dir() {
            let mut reader = fs::read_dir(&path).await.map_err(|e| map_io(name, e))?;
            if reader
                .next_entry()
                .await
                .map_err(|e| map_io(name, e))?
                .is_some()
            {
                return Err(HostError::NotEmpty {
                    name: name.to_string(),
                });
            }
            fs::remove_dir(&path).await.map_err(|e| map_io(name, e))
        } else {
            fs::remove_file(&path).await.map_err(|e| map_io(name, e))
        }
    }
}

/// A file inside an [`FsHostDirectory`].
#[derive(Debug, Clone)]
struct FsHostFile {
    path: PathBuf,
    name: String,
}

#[async_trait]
impl HostFile for FsHostFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_all_bytes(&self) -> Result<Vec<u8>, HostError> {
        fs::read(&self.path).await.map_err(|e| map_io(&self.name, e))
    }

    async fn open_for_write(&self) -> Result<Box<dyn HostWritable>, HostError> {
        Ok(Box::new(FsWritable {
            target: self.path.clone(),
            name: self.name.clone(),
            buffer: Vec::new(),
            executable: false,
            closed: false,
        }))
    }

    #[cfg(unix)]
    async fn is_executable(&self) -> Result<bool, HostError> {
        use std::os::unix::fs::PermissionsExt;
        let meta = fs::metadata(&self.path)
            .await
            .map_err(|e| map_io(&self.name, e))?;
        Ok(meta.permissions().mode() & 0o111 != 0)
    }
}

struct FsWritable {
    target: PathBuf,
    name: String,
    buffer: Vec<u8>,
    executable: bool,
    closed: bool,
}

impl FsWritable {
    /// Permissions for the replacement file: the target's current ones,
    /// plus execute bits when requested. `None` keeps the temp file's.
    async fn permissions(&self) -> Option<std::fs::Permissions> {
        let current = fs::metadata(&self.target).await.ok().map(|m| m.permissions());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if self.executable {
                let base = match &current {
                    Some(perms) => perms.mode(),
                    None => fs::metadata(self.temp()).await.ok()?.permissions().mode(),
                };
                return Some(std::fs::Permissions::from_mode(base | ((base & 0o444) >> 2)));
            }
        }
        current
    }

    fn temp(&self) -> PathBuf {
        self.target
            .with_file_name(format!(".{}.gitbridge-tmp", self.name))
    }
}

#[async_trait]
impl HostWritable for FsWritable {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::Closed {
                name: self.name.clone(),
            });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn set_executable(&mut self) {
        self.executable = true;
    }

    async fn close(&mut self) -> Result<(), HostError> {
        if self.closed {
            return Err(HostError::Closed {
                name: self.name.clone(),
            });
        }
        self.closed = true;

        let temp = self.temp();
        fs::write(&temp, &self.buffer)
            .await
            .map_err(|e| map_io(&self.name, e))?;

        let replaced = async {
            if let Some(perms) = self.permissions().await {
                fs::set_permissions(&temp, perms).await?;
            }
            fs::rename(&temp, &self.target).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;
        if let Err(e) = replaced {
            let _ = fs::remove_file(&temp).await;
            return Err(map_io(&self.name, e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::write_all;
    use tempfile::TempDir;

    #[test]
    fn open_requires_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();

        assert!(FsHostDirectory::open(dir.path()).is_ok());
        assert!(matches!(
            FsHostDirectory::open(&file),
            Err(HostError::TypeMismatch { .. })
        ));
        assert!(matches!(
            FsHostDirectory::open(dir.path().join("missing")),
            Err(HostError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_create_and_write() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        let handle = FsHostDirectory::open(dir.path()).unwrap();

        let sub = handle.get_subdirectory("a", true).await.unwrap();
        let file = sub.get_file("inner.txt", true).await.unwrap();
        write_all(file.as_ref(), b"payload").await.unwrap();

        let entries = handle.list_entries().await.unwrap();
        assert_eq!(
            entries,
            vec![
                HostEntry {
                    name: "a".into(),
                    kind: EntryKind::Directory
                },
                HostEntry {
                    name: "b.txt".into(),
                    kind: EntryKind::File
                },
            ]
        );
        assert_eq!(
            std::fs::read(dir.path().join("a/inner.txt")).unwrap(),
            b"payload"
        );
        assert!(!dir.path().join("a/.inner.txt.gitbridge-tmp").exists());
    }

    #[tokio::test]
    async fn missing_without_create_is_not_found() {
        let dir = TempDir::new().unwrap();
        let handle = FsHostDirectory::open(dir.path()).unwrap();
        assert!(matches!(
            handle.get_subdirectory("nope", false).await,
            Err(HostError::NotFound { .. })
        ));
        assert!(matches!(
            handle.get_file("nope", false).await,
            Err(HostError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn remove_entry_files_and_empty_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), b"x").unwrap();
        std::fs::create_dir_all(dir.path().join("full/inner")).unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let handle = FsHostDirectory::open(dir.path()).unwrap();

        handle.remove_entry("f").await.unwrap();
        handle.remove_entry("empty").await.unwrap();
        assert!(!dir.path().join("f").exists());
        assert!(!dir.path().join("empty").exists());

        assert!(matches!(
            handle.remove_entry("full").await,
            Err(HostError::NotEmpty { .. })
        ));
        assert!(dir.path().join("full/inner").is_dir());
        assert!(matches!(
            handle.remove_entry("gone").await,
            Err(HostError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::{symlink, PermissionsExt};

        fn mode(path: &Path) -> u32 {
            std::fs::metadata(path).unwrap().permissions().mode() & 0o777
        }

        #[tokio::test]
        async fn symlinks_are_listed_but_never_opened() {
            let outside = TempDir::new().unwrap();
            std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
            let dir = TempDir::new().unwrap();
            symlink(outside.path().join("secret.txt"), dir.path().join("leak")).unwrap();
            symlink(outside.path(), dir.path().join("elsewhere")).unwrap();
            let handle = FsHostDirectory::open(dir.path()).unwrap();

            let entries = handle.list_entries().await.unwrap();
            assert!(entries.iter().all(|e| e.kind == EntryKind::Symlink));
            assert_eq!(entries.len(), 2);

            assert!(matches!(
                handle.get_file("leak", false).await,
                Err(HostError::TypeMismatch { .. })
            ));
            assert!(matches!(
                handle.get_subdirectory("elsewhere", true).await,
                Err(HostError::TypeMismatch { .. })
            ));
        }

        #[tokio::test]
        async fn rewrite_keeps_existing_mode() {
            let dir = TempDir::new().unwrap();
            let script = dir.path().join("run.sh");
            std::fs::write(&script, b"#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            let handle = FsHostDirectory::open(dir.path()).unwrap();

            let file = handle.get_file("run.sh", false).await.unwrap();
            assert!(file.is_executable().await.unwrap());
            write_all(file.as_ref(), b"#!/bin/sh\necho hi\n").await.unwrap();

            assert_eq!(mode(&script), 0o755);
            assert_eq!(std::fs::read(&script).unwrap(), b"#!/bin/sh\necho hi\n");
        }

        #[tokio::test]
        async fn new_file_can_be_made_executable() {
            let dir = TempDir::new().unwrap();
            let handle = FsHostDirectory::open(dir.path()).unwrap();

            let plain = handle.get_file("notes.txt", true).await.unwrap();
            write_all(plain.as_ref(), b"n").await.unwrap();
            assert!(!plain.is_executable().await.unwrap());

            let tool = handle.get_file("tool", true).await.unwrap();
            crate::host::write_with_mode(tool.as_ref(), b"#!/bin/sh\n", true)
                .await
                .unwrap();
            assert!(tool.is_executable().await.unwrap());
            assert_eq!(mode(&dir.path().join("tool")) & 0o100, 0o100);
        }
    }

    #[tokio::test]
    async fn writer_rejects_use_after_close() {
        let dir = TempDir::new().unwrap();
        let handle = FsHostDirectory::open(dir.path()).unwrap();
        let file = handle.get_file("x", true).await.unwrap();
        let mut writer = file.open_for_write().await.unwrap();
        writer.close().await.unwrap();
        assert!(matches!(
            writer.write(b"late").await,
            Err(HostError::Closed { .. })
        ));
    }
}
