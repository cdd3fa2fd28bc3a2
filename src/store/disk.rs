//! store::disk
//!
//! Shared tokio::fs operations for disk-backed stores. The virtual path is
//! carried along only for error messages.
//!
//! Symbolic links are never followed: `stat` describes the link itself and
//! reading, writing, or listing through one fails with
//! [`StoreError::SymbolicLink`].

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use super::{StoreError, StoreStat};

fn io_error(path: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_string(),
        source,
    }
}

/// Like [`io_error`] but maps a missing entry to `NotFound`.
fn lookup_error(path: &str, source: std::io::Error) -> StoreError {
    if source.kind() == ErrorKind::NotFound {
        StoreError::NotFound {
            path: path.to_string(),
        }
    } else {
        io_error(path, source)
    }
}

/// Fail when `local` itself is a symbolic link.
async fn refuse_link(path: &str, local: &Path) -> Result<(), StoreError> {
    match fs::symlink_metadata(local).await {
        Ok(meta) if meta.file_type().is_symlink() => Err(StoreError::SymbolicLink {
            path: path.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Fail when a directory between `root` and `local` is a symbolic link.
/// Components that do not exist yet end the check.
pub(super) async fn refuse_linked_parents(
    path: &str,
    root: &Path,
    local: &Path,
) -> Result<(), StoreError> {
    let Ok(relative) = local.strip_prefix(root) else {
        return Ok(());
    };
    let components: Vec<_> = relative.components().collect();
    let mut current = root.to_path_buf();
    for component in components.iter().take(components.len().saturating_sub(1)) {
        current.push(component);
        match fs::symlink_metadata(&current).await {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(StoreError::SymbolicLink {
                    path: path.to_string(),
                })
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Ok(())
}

pub(super) async fn mkdir(path: &str, local: &Path, recursive: bool) -> Result<(), StoreError> {
    let result = if recursive {
        fs::create_dir_all(local).await
    } else {
        fs::create_dir(local).await
    };
    result.map_err(|e| io_error(path, e))
}

pub(super) async fn read_file(path: &str, local: &Path) -> Result<Vec<u8>, StoreError> {
    refuse_link(path, local).await?;
    fs::read(local).await.map_err(|e| lookup_error(path, e))
}

pub(super) async fn write_file(path: &str, local: &Path, content: &[u8]) -> Result<(), StoreError> {
    refuse_link(path, local).await?;
    fs::write(local, content).await.map_err(|e| io_error(path, e))
}

pub(super) async fn readdir(path: &str, local: &Path) -> Result<Vec<String>, StoreError> {
    refuse_link(path, local).await?;
    let mut reader = fs::read_dir(local).await.map_err(|e| io_error(path, e))?;
    let mut names = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(path, e))? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

pub(super) async fn stat(path: &str, local: &Path) -> Result<StoreStat, StoreError> {
    let meta = fs::symlink_metadata(local)
        .await
        .map_err(|e| lookup_error(path, e))?;
    Ok(StoreStat {
        is_directory: meta.is_dir(),
        is_file: meta.is_file(),
        is_symlink: meta.file_type().is_symlink(),
        is_executable: meta.is_file() && is_executable(&meta),
    })
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    false
}

/// Add or clear the executable bits of a regular file.
#[cfg(unix)]
pub(super) async fn set_executable(
    path: &str,
    local: &Path,
    executable: bool,
) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    refuse_link(path, local).await?;
    let meta = fs::metadata(local).await.map_err(|e| lookup_error(path, e))?;
    let mode = meta.permissions().mode();
    // execute bits follow the read bits, like `chmod +x` under a umask
    let updated = if executable {
        mode | ((mode & 0o444) >> 2)
    } else {
        mode & !0o111
    };
    if updated != mode {
        fs::set_permissions(local, std::fs::Permissions::from_mode(updated))
            .await
            .map_err(|e| io_error(path, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub(super) async fn set_executable(
    path: &str,
    local: &Path,
    _executable: bool,
) -> Result<(), StoreError> {
    refuse_link(path, local).await?;
    fs::metadata(local)
        .await
        .map(|_| ())
        .map_err(|e| lookup_error(path, e))
}

pub(super) async fn unlink(path: &str, local: &Path) -> Result<(), StoreError> {
    fs::remove_file(local).await.map_err(|e| io_error(path, e))
}

pub(super) async fn rmdir(path: &str, local: &Path, recursive: bool) -> Result<(), StoreError> {
    let result = if recursive {
        fs::remove_dir_all(local).await
    } else {
        fs::remove_dir(local).await
    };
    result.map_err(|e| io_error(path, e))
}
