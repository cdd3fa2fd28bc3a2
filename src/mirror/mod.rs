//! mirror
//!
//! Recursive synchronization between a virtual store subtree and a host
//! directory handle, in either direction.
//!
//! # Architecture
//!
//! Each pass is an explicit work stack of `(directory, path)` pairs, so it
//! walks depth-first without recursion. Within one directory:
//!
//! 1. Child directories are created at the destination and pushed on the
//!    stack
//! 2. The directory's files are copied with bounded concurrency
//!
//! A directory is always created before any file beneath it is written,
//! because its files are only copied once it is popped.
//!
//! # Failure policy
//!
//! Passes are best-effort. A failing entry is logged with `tracing::warn!`,
//! recorded in the [`MirrorReport`], and skipped; the walk continues. A
//! directory that cannot be created is still walked, since it may already
//! exist with unexpected permission semantics. Only failures at the pass
//! root are returned as errors.
//!
//! # Links and modes
//!
//! Symbolic links are never followed in either direction; each one is
//! recorded in the report as skipped. Executable bits travel with files:
//! an executable source file becomes executable at the destination, and a
//! rewritten host file keeps its existing permissions.
//!
//! # Removals
//!
//! Exports only add and overwrite. After an operation that deletes files
//! from the working tree, the caller diffs [`DirectoryMirror::list_tree`]
//! before and after and hands the difference to
//! [`DirectoryMirror::prune_host`].
//!
//! # Example
//!
//! ```ignore
//! use gitbridge::mirror::{DirectoryMirror, IgnoreList};
//!
//! let mirror = DirectoryMirror::new(store.clone(), 8);
//! let report = mirror
//!     .import_from_host(host, "/proj", &IgnoreList::new(["node_modules"]))
//!     .await?;
//! println!("{} files imported", report.files_copied);
//! ```

mod ignore;
mod report;

pub use ignore::IgnoreList;
pub use report::{MirrorReport, SkippedEntry};

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use thiserror::Error;

use crate::core::paths;
use crate::error::ErrorKind;
use crate::host::{self, EntryKind, HostDirectory, HostError};
use crate::store::{StoreError, VirtualStore};

/// Name of the Git engine's metadata directory.
pub const GIT_DIR: &str = ".git";

const SYMLINK_SKIPPED: &str = "symbolic links are not mirrored";

/// Errors that abort a mirror pass.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),

    /// Relative path is empty or climbs above the repository root.
    #[error("invalid mirror path: '{path}'")]
    InvalidPath { path: String },
}

impl MirrorError {
    /// Classification in the crate-wide taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MirrorError::Store(e) => e.kind(),
            MirrorError::Host(e) => e.kind(),
            MirrorError::InvalidPath { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// Copies trees between a [`VirtualStore`] and [`HostDirectory`] handles.
#[derive(Debug, Clone)]
pub struct DirectoryMirror {
    store: Arc<dyn VirtualStore>,
    concurrency: usize,
}

impl DirectoryMirror {
    /// `concurrency` bounds parallel file copies within one directory.
    pub fn new(store: Arc<dyn VirtualStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn VirtualStore> {
        &self.store
    }

    // =========================================================================
    // Host -> store
    // =========================================================================

    /// Copy every non-ignored entry under `host` into the store at `target`.
    ///
    /// Existing store directories are reused. Existing files are
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Only if the root of `host` cannot be listed.
    pub async fn import_from_host(
        &self,
        host: Arc<dyn HostDirectory>,
        target: &str,
        ignore: &IgnoreList,
    ) -> Result<MirrorReport, MirrorError> {
        let target = paths::normalize(target);
        tracing::debug!(dest = %target, host = host.name(), "importing from host");

        let mut report = MirrorReport::default();
        if let Err(e) = self.store.mkdir(&target, true).await {
            tracing::debug!("creating {target} failed, importing into it anyway: {e}");
        }

        // root listing failures abort; deeper ones are skipped
        let root_entries = host.list_entries().await?;
        let mut stack = vec![(host, target.clone(), String::new(), Some(root_entries))];

        while let Some((dir, vpath, rel, listed)) = stack.pop() {
            let entries = match listed {
                Some(entries) => entries,
                None => match dir.list_entries().await {
                    Ok(entries) => entries,
                    Err(e) => {
                        report.skip(&rel, e.kind(), e);
                        continue;
                    }
                },
            };

            let mut files = Vec::new();
            for entry in entries {
                if ignore.is_ignored(&entry.name) {
                    report.ignored += 1;
                    continue;
                }
                let child = paths::join(&[vpath.as_str(), entry.name.as_str()]);
                let child_rel = paths::join(&[rel.as_str(), entry.name.as_str()]);

                match entry.kind {
                    EntryKind::Directory => {
                        match self.store.mkdir(&child, true).await {
                            Ok(()) => report.directories += 1,
                            Err(e) => tracing::debug!(
                                "creating {child} failed, syncing its contents anyway: {e}"
                            ),
                        }
                        match dir.get_subdirectory(&entry.name, false).await {
                            Ok(sub) => stack.push((sub, child, child_rel, None)),
                            Err(e) => report.skip(&child_rel, e.kind(), e),
                        }
                    }
                    EntryKind::File => files.push((entry.name, child, child_rel)),
                    EntryKind::Symlink => {
                        report.skip(&child_rel, ErrorKind::InvalidInput, SYMLINK_SKIPPED)
                    }
                }
            }

            let results = stream::iter(files)
                .map(|(name, child, child_rel)| {
                    let dir = dir.clone();
                    let store = self.store.clone();
                    async move {
                        let copied = async {
                            let file = dir.get_file(&name, false).await?;
                            let bytes = file.read_all_bytes().await?;
                            store.write_file(&child, &bytes).await?;
                            if file.is_executable().await? {
                                store.set_executable(&child, true).await?;
                            }
                            Ok::<(), MirrorError>(())
                        }
                        .await;
                        (child_rel, copied)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect::<Vec<_>>()
                .await;
            tally(&mut report, results);
        }

        tracing::debug!(
            files = report.files_copied,
            skipped = report.skipped.len(),
            "host import finished"
        );
        Ok(report)
    }

    // =========================================================================
    // Store -> host
    // =========================================================================

    /// Copy the working tree under `virtual_path` into `host`.
    ///
    /// With `repo_segment`, files land in that (created) subdirectory of
    /// `host`. The top-level `.git` directory is never exported here; see
    /// [`export_metadata`](Self::export_metadata).
    ///
    /// # Errors
    ///
    /// If `virtual_path` cannot be listed or the repo segment cannot be
    /// opened on the host.
    pub async fn export_to_host(
        &self,
        virtual_path: &str,
        host: Arc<dyn HostDirectory>,
        repo_segment: Option<&str>,
        ignore: &IgnoreList,
    ) -> Result<MirrorReport, MirrorError> {
        let root = resolve_segment(host, repo_segment).await?;
        self.export_tree(&paths::normalize(virtual_path), root, ignore, true)
            .await
    }

    /// Copy the repository's `.git` directory under `repo_root` into
    /// `host` (or its `repo_segment` subdirectory). Nothing is ignored.
    pub async fn export_metadata(
        &self,
        repo_root: &str,
        host: Arc<dyn HostDirectory>,
        repo_segment: Option<&str>,
    ) -> Result<MirrorReport, MirrorError> {
        let root = resolve_segment(host, repo_segment).await?;
        let git_host = root.get_subdirectory(GIT_DIR, true).await?;
        let git_path = paths::join(&[repo_root, GIT_DIR]);
        self.export_tree(&git_path, git_host, &IgnoreList::empty(), false)
            .await
    }

    /// Write one file to its nested location under `host`, creating any
    /// missing host directories.
    ///
    /// This is the fast path after a single store write; no tree walk.
    pub async fn export_single_file(
        &self,
        relative_path: &str,
        content: &[u8],
        host: Arc<dyn HostDirectory>,
        repo_segment: Option<&str>,
    ) -> Result<(), MirrorError> {
        let normalized = paths::normalize(relative_path);
        let segments = paths::segments(&normalized);
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(MirrorError::InvalidPath {
                path: relative_path.to_string(),
            });
        };
        if segments.first() == Some(&"..") {
            return Err(MirrorError::InvalidPath {
                path: relative_path.to_string(),
            });
        }

        let mut dir = resolve_segment(host, repo_segment).await?;
        for segment in parents {
            dir = dir.get_subdirectory(segment, true).await?;
        }
        let file = dir.get_file(leaf, true).await?;
        host::write_all(file.as_ref(), content).await?;
        tracing::debug!(path = %normalized, bytes = content.len(), "exported file to host");
        Ok(())
    }

    /// Relative paths of every file and directory under `virtual_root`,
    /// minus ignored names and the top-level `.git`. Symbolic links are
    /// left out.
    ///
    /// # Errors
    ///
    /// Any listing failure; a partial listing would make pruning unsafe.
    pub async fn list_tree(
        &self,
        virtual_root: &str,
        ignore: &IgnoreList,
    ) -> Result<BTreeSet<String>, MirrorError> {
        let mut entries = BTreeSet::new();
        let mut stack = vec![(paths::normalize(virtual_root), String::new())];

        while let Some((vpath, rel)) = stack.pop() {
            for name in self.store.readdir(&vpath).await? {
                if (rel.is_empty() && name == GIT_DIR) || ignore.is_ignored(&name) {
                    continue;
                }
                let child = paths::join(&[vpath.as_str(), name.as_str()]);
                let child_rel = paths::join(&[rel.as_str(), name.as_str()]);
                let stat = self.store.stat(&child).await?;
                if stat.is_directory {
                    entries.insert(child_rel.clone());
                    stack.push((child, child_rel));
                } else if stat.is_file {
                    entries.insert(child_rel);
                }
            }
        }
        Ok(entries)
    }

    /// Remove `removed` (paths relative to the repository root) from `host`
    /// or its `repo_segment` subdirectory.
    ///
    /// Directories are removed only once empty, so host-only content such
    /// as ignored build output keeps its directory alive. Entries already
    /// gone are not an error.
    pub async fn prune_host(
        &self,
        removed: &BTreeSet<String>,
        host: Arc<dyn HostDirectory>,
        repo_segment: Option<&str>,
    ) -> Result<MirrorReport, MirrorError> {
        let root = resolve_segment(host, repo_segment).await?;
        let mut report = MirrorReport::default();

        // a child sorts after its parent, so reverse order empties
        // directories before they are removed
        'paths: for rel in removed.iter().rev() {
            let segments = paths::segments(rel);
            let Some((leaf, parents)) = segments.split_last() else {
                continue;
            };
            let mut dir = root.clone();
            for segment in parents {
                match dir.get_subdirectory(segment, false).await {
                    Ok(sub) => dir = sub,
                    Err(HostError::NotFound { .. }) => continue 'paths,
                    Err(e) => {
                        report.skip(rel, e.kind(), e);
                        continue 'paths;
                    }
                }
            }
            match dir.remove_entry(leaf).await {
                Ok(()) => report.removed += 1,
                Err(HostError::NotFound { .. }) => {}
                Err(HostError::NotEmpty { .. }) => {
                    tracing::debug!(path = %rel, "keeping host directory with extra content")
                }
                Err(e) => report.skip(rel, e.kind(), e),
            }
        }

        tracing::debug!(removed = report.removed, "host prune finished");
        Ok(report)
    }

    async fn export_tree(
        &self,
        virtual_root: &str,
        host_root: Arc<dyn HostDirectory>,
        ignore: &IgnoreList,
        skip_git_dir: bool,
    ) -> Result<MirrorReport, MirrorError> {
        tracing::debug!(source = %virtual_root, host = host_root.name(), "exporting to host");

        let mut report = MirrorReport::default();
        let root_names = self.store.readdir(virtual_root).await?;
        let mut stack = vec![(
            virtual_root.to_string(),
            host_root,
            String::new(),
            Some(root_names),
        )];

        while let Some((vpath, dir, rel, listed)) = stack.pop() {
            let at_root = rel.is_empty();
            let names = match listed {
                Some(names) => names,
                None => match self.store.readdir(&vpath).await {
                    Ok(names) => names,
                    Err(e) => {
                        report.skip(&rel, e.kind(), e);
                        continue;
                    }
                },
            };

            let mut files = Vec::new();
            for name in names {
                if at_root && skip_git_dir && name == GIT_DIR {
                    continue;
                }
                if ignore.is_ignored(&name) {
                    report.ignored += 1;
                    continue;
                }
                let child = paths::join(&[vpath.as_str(), name.as_str()]);
                let child_rel = paths::join(&[rel.as_str(), name.as_str()]);

                let stat = match self.store.stat(&child).await {
                    Ok(stat) => stat,
                    Err(e) => {
                        report.skip(&child_rel, e.kind(), e);
                        continue;
                    }
                };
                if stat.is_directory {
                    match dir.get_subdirectory(&name, true).await {
                        Ok(sub) => {
                            report.directories += 1;
                            stack.push((child, sub, child_rel, None));
                        }
                        Err(e) => report.skip(&child_rel, e.kind(), e),
                    }
                } else if stat.is_file {
                    files.push((name, child, child_rel, stat.is_executable));
                } else if stat.is_symlink {
                    report.skip(&child_rel, ErrorKind::InvalidInput, SYMLINK_SKIPPED);
                }
            }

            let results = stream::iter(files)
                .map(|(name, child, child_rel, executable)| {
                    let dir = dir.clone();
                    let store = self.store.clone();
                    async move {
                        let copied = async {
                            let bytes = store.read_file(&child).await?;
                            let file = dir.get_file(&name, true).await?;
                            host::write_with_mode(file.as_ref(), &bytes, executable).await?;
                            Ok::<(), MirrorError>(())
                        }
                        .await;
                        (child_rel, copied)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect::<Vec<_>>()
                .await;
            tally(&mut report, results);
        }

        tracing::debug!(
            files = report.files_copied,
            skipped = report.skipped.len(),
            "host export finished"
        );
        Ok(report)
    }
}

async fn resolve_segment(
    host: Arc<dyn HostDirectory>,
    repo_segment: Option<&str>,
) -> Result<Arc<dyn HostDirectory>, MirrorError> {
    match repo_segment {
        Some(segment) if !segment.is_empty() => Ok(host.get_subdirectory(segment, true).await?),
        _ => Ok(host),
    }
}

fn tally(report: &mut MirrorReport, results: Vec<(String, Result<(), MirrorError>)>) {
    for (rel, result) in results {
        match result {
            Ok(()) => report.files_copied += 1,
            Err(e) => report.skip(&rel, e.kind(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHostDirectory;
    use crate::store::SandboxStore;
    use tempfile::TempDir;

    fn mirror() -> (TempDir, Arc<dyn VirtualStore>, DirectoryMirror) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn VirtualStore> = Arc::new(SandboxStore::new(dir.path()).unwrap());
        let mirror = DirectoryMirror::new(store.clone(), 4);
        (dir, store, mirror)
    }

    fn sample_host() -> MemoryHostDirectory {
        let host = MemoryHostDirectory::new("proj");
        host.insert_file("README.md", "# proj\n").unwrap();
        host.insert_file("src/main.rs", "fn main() {}\n").unwrap();
        host.insert_file("src/util/mod.rs", "").unwrap();
        host.insert_file("node_modules/pkg/index.js", "x").unwrap();
        host.insert_dir("empty").unwrap();
        host
    }

    mod import {
        use super::*;

        #[tokio::test]
        async fn copies_tree_and_honors_ignore() {
            let (_dir, store, mirror) = mirror();
            let host = sample_host();
            let report = mirror
                .import_from_host(host.shared(), "/proj", &IgnoreList::new(["node_modules"]))
                .await
                .unwrap();

            assert!(report.is_complete());
            assert_eq!(report.files_copied, 3);
            assert_eq!(report.ignored, 1);
            assert_eq!(
                store.read_file("/proj/src/main.rs").await.unwrap(),
                b"fn main() {}\n"
            );
            assert!(store.is_dir("/proj/empty").await.unwrap());
            assert!(!store.exists("/proj/node_modules").await.unwrap());
        }

        #[tokio::test]
        async fn existing_directories_are_reused() {
            let (_dir, store, mirror) = mirror();
            store.mkdir("/proj/src", true).await.unwrap();
            store.write_file("/proj/src/keep.rs", b"keep").await.unwrap();

            let report = mirror
                .import_from_host(sample_host().shared(), "/proj", &IgnoreList::empty())
                .await
                .unwrap();

            assert!(report.is_complete());
            assert_eq!(store.read_file("/proj/src/keep.rs").await.unwrap(), b"keep");
            assert!(store.exists("/proj/node_modules/pkg/index.js").await.unwrap());
        }

        #[tokio::test]
        async fn unreadable_file_is_skipped() {
            let (_dir, store, mirror) = mirror();
            let host = sample_host();
            host.set_unreadable("src/main.rs");

            let report = mirror
                .import_from_host(host.shared(), "/proj", &IgnoreList::new(["node_modules"]))
                .await
                .unwrap();

            assert_eq!(report.files_copied, 2);
            assert_eq!(report.skipped.len(), 1);
            assert_eq!(report.skipped[0].path, "src/main.rs");
            assert_eq!(report.skipped[0].kind, ErrorKind::PermissionDenied);
            assert!(store.exists("/proj/src/util/mod.rs").await.unwrap());
        }
    }

    mod export {
        use super::*;

        #[tokio::test]
        async fn working_tree_skips_git_dir() {
            let (_dir, store, mirror) = mirror();
            store.mkdir("/repo/.git/refs", true).await.unwrap();
            store.write_file("/repo/.git/HEAD", b"ref: refs/heads/main\n").await.unwrap();
            store.mkdir("/repo/docs", true).await.unwrap();
            store.write_file("/repo/docs/a.md", b"a").await.unwrap();

            let host = MemoryHostDirectory::new("root");
            let report = mirror
                .export_to_host("/repo", host.shared(), Some("repo"), &IgnoreList::empty())
                .await
                .unwrap();

            assert_eq!(report.files_copied, 1);
            assert_eq!(host.read("repo/docs/a.md"), Some(b"a".to_vec()));
            assert!(!host.contains("repo/.git"));
        }

        #[tokio::test]
        async fn metadata_export_copies_git_dir() {
            let (_dir, store, mirror) = mirror();
            store.mkdir("/repo/.git/refs/heads", true).await.unwrap();
            store.write_file("/repo/.git/HEAD", b"ref: refs/heads/main\n").await.unwrap();
            store.write_file("/repo/README.md", b"r").await.unwrap();

            let host = MemoryHostDirectory::new("repo");
            mirror
                .export_metadata("/repo", host.shared(), None)
                .await
                .unwrap();

            assert_eq!(host.read(".git/HEAD"), Some(b"ref: refs/heads/main\n".to_vec()));
            assert!(host.contains(".git/refs/heads"));
            assert!(!host.contains("README.md"));
        }

        #[tokio::test]
        async fn missing_source_is_an_error() {
            let (_dir, _store, mirror) = mirror();
            let host = MemoryHostDirectory::new("repo");
            let err = mirror
                .export_to_host("/nope", host.shared(), None, &IgnoreList::empty())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Io);
        }

        #[tokio::test]
        async fn read_only_host_file_is_skipped() {
            let (_dir, store, mirror) = mirror();
            store.mkdir("/repo", true).await.unwrap();
            store.write_file("/repo/a", b"1").await.unwrap();
            store.write_file("/repo/b", b"2").await.unwrap();

            let host = MemoryHostDirectory::new("repo");
            host.insert_file("a", "old").unwrap();
            host.set_read_only("a");

            let report = mirror
                .export_to_host("/repo", host.shared(), None, &IgnoreList::empty())
                .await
                .unwrap();
            assert_eq!(report.files_copied, 1);
            assert_eq!(report.skipped[0].path, "a");
            assert_eq!(host.read("a"), Some(b"old".to_vec()));
            assert_eq!(host.read("b"), Some(b"2".to_vec()));
        }
    }

    mod links_and_modes {
        use super::*;

        #[tokio::test]
        async fn executable_bit_travels_both_ways() {
            let (_dir, store, mirror) = mirror();
            let source = MemoryHostDirectory::new("proj");
            source.insert_file("bin/run.sh", "#!/bin/sh\n").unwrap();
            source.insert_file("notes.txt", "n").unwrap();
            source.set_executable("bin/run.sh");

            mirror
                .import_from_host(source.shared(), "/proj", &IgnoreList::empty())
                .await
                .unwrap();
            if cfg!(unix) {
                assert!(store.stat("/proj/bin/run.sh").await.unwrap().is_executable);
            }
            assert!(!store.stat("/proj/notes.txt").await.unwrap().is_executable);

            let dest = MemoryHostDirectory::new("out");
            mirror
                .export_to_host("/proj", dest.shared(), None, &IgnoreList::empty())
                .await
                .unwrap();
            assert_eq!(dest.is_executable("bin/run.sh"), cfg!(unix));
            assert!(!dest.is_executable("notes.txt"));
        }

        #[cfg(unix)]
        #[tokio::test]
        async fn store_symlink_is_skipped_on_export() {
            let (dir, store, mirror) = mirror();
            let outside = TempDir::new().unwrap();
            std::fs::write(outside.path().join("secret.txt"), b"TOP-SECRET").unwrap();
            store.mkdir("/repo", true).await.unwrap();
            store.write_file("/repo/a.txt", b"a").await.unwrap();
            std::os::unix::fs::symlink(
                outside.path().join("secret.txt"),
                dir.path().join("repo/leak"),
            )
            .unwrap();

            let host = MemoryHostDirectory::new("repo");
            let report = mirror
                .export_to_host("/repo", host.shared(), None, &IgnoreList::empty())
                .await
                .unwrap();

            assert_eq!(report.files_copied, 1);
            assert_eq!(report.skipped.len(), 1);
            assert_eq!(report.skipped[0].path, "leak");
            assert!(!host.contains("leak"));
        }
    }

    mod pruning {
        use super::*;

        #[tokio::test]
        async fn list_tree_skips_git_dir_and_ignored() {
            let (_dir, store, mirror) = mirror();
            store.mkdir("/repo/.git/refs", true).await.unwrap();
            store.mkdir("/repo/src/node_modules", true).await.unwrap();
            store.write_file("/repo/src/lib.rs", b"").await.unwrap();
            store.write_file("/repo/README.md", b"").await.unwrap();

            let tree = mirror
                .list_tree("/repo", &IgnoreList::new(["node_modules"]))
                .await
                .unwrap();
            let expected: BTreeSet<String> = ["README.md", "src", "src/lib.rs"]
                .into_iter()
                .map(String::from)
                .collect();
            assert_eq!(tree, expected);
        }

        #[tokio::test]
        async fn removes_deleted_paths_and_keeps_the_rest() {
            let (_dir, _store, mirror) = mirror();
            let host = MemoryHostDirectory::new("root");
            host.insert_file("proj/keep.txt", "k").unwrap();
            host.insert_file("proj/gone.txt", "g").unwrap();
            host.insert_file("proj/old/a.rs", "a").unwrap();
            host.insert_file("proj/build/out.o", "o").unwrap();
            host.insert_file("proj/build/gen.rs", "g").unwrap();

            let removed: BTreeSet<String> = [
                "gone.txt",
                "old",
                "old/a.rs",
                "build",
                "build/gen.rs",
                "never/existed.txt",
            ]
            .into_iter()
            .map(String::from)
            .collect();
            let report = mirror
                .prune_host(&removed, host.shared(), Some("proj"))
                .await
                .unwrap();

            assert!(report.is_complete());
            assert_eq!(report.removed, 4);
            assert!(host.contains("proj/keep.txt"));
            assert!(!host.contains("proj/gone.txt"));
            assert!(!host.contains("proj/old"));
            // host-only content keeps its directory
            assert!(host.contains("proj/build/out.o"));
            assert!(!host.contains("proj/build/gen.rs"));
        }
    }

    mod single_file {
        use super::*;

        #[tokio::test]
        async fn creates_nested_directories() {
            let (_dir, _store, mirror) = mirror();
            let host = MemoryHostDirectory::new("root");
            mirror
                .export_single_file("src\\deep/x.rs", b"x", host.shared(), Some("proj"))
                .await
                .unwrap();
            assert_eq!(host.read("proj/src/deep/x.rs"), Some(b"x".to_vec()));
        }

        #[tokio::test]
        async fn rejects_escaping_paths() {
            let (_dir, _store, mirror) = mirror();
            let host = MemoryHostDirectory::new("root");
            for bad in ["", "../x", "."] {
                let err = mirror
                    .export_single_file(bad, b"x", host.shared(), None)
                    .await
                    .unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidInput, "{bad:?}");
            }
        }
    }

    #[tokio::test]
    async fn round_trip_is_identical() {
        let (_dir, _store, mirror) = mirror();
        let source = MemoryHostDirectory::new("proj");
        source.insert_file("a.txt", "alpha").unwrap();
        source.insert_file("nested/b.bin", vec![0u8, 159, 255]).unwrap();
        source.insert_file("nested/deeper/c", "").unwrap();
        source.insert_dir("nested/empty").unwrap();

        mirror
            .import_from_host(source.shared(), "/proj", &IgnoreList::empty())
            .await
            .unwrap();
        let dest = MemoryHostDirectory::new("out");
        mirror
            .export_to_host("/proj", dest.shared(), None, &IgnoreList::empty())
            .await
            .unwrap();

        assert_eq!(source.snapshot(), dest.snapshot());
    }
}
