//! sync
//!
//! The [`GitSync`] facade: one current repository, its credential binding,
//! and the ordering of Git operations against host mirroring.
//!
//! # Architecture
//!
//! ```text
//! GitSync ──> RepositoryClient ──> VirtualStore (the Git-visible truth)
//!    │
//!    └──────> DirectoryMirror  <─> HostDirectory (user-visible copy)
//! ```
//!
//! - Opening a host directory imports `.git` first, then the working tree
//! - Git operations only ever touch the store
//! - After a mutating operation, the changed part is exported back to the
//!   bound host directory (if any). Export failures are logged and
//!   reported as [`MirrorStatus::Failed`], never as errors of the operation
//! - `checkout` and `pull` also remove from the host the working tree
//!   entries they deleted; nothing else ever deletes host content
//!
//! Mutating operations are serialized by a per-facade lock. Every
//! operation that needs a repository fails with
//! [`SyncError::NoRepositoryBound`] before touching any store when none is
//! current.
//!
//! # Example
//!
//! ```ignore
//! use gitbridge::sync::GitSync;
//!
//! let sync = GitSync::new(store, config);
//! sync.open_from_host_handle(host, "/proj").await?;
//! sync.write_file("README.md", b"# hello\n").await?;
//! sync.add("README.md").await?;
//! sync.commit("Update readme", None).await?;
//! ```

mod handle;

pub use handle::{MirrorStatus, RepoHandle};

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::core::config::Config;
use crate::core::paths;
use crate::core::types::{
    Author, CloneOptions, Commit, Credentials, GitStatus, GitignoreTemplate, Oid,
};
use crate::credentials::CredentialProvider;
use crate::error::SyncError;
use crate::git::{CancelToken, PullOutcome, RepositoryClient, TransportOptions};
use crate::host::{HostDirectory, HostError};
use crate::mirror::{DirectoryMirror, IgnoreList, MirrorError, MirrorReport, GIT_DIR};
use crate::store::VirtualStore;

/// How much of the repository to export after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// `.git` only (index and refs changed)
    Metadata,
    /// Working tree, then `.git`
    Full,
}

/// Public entry point over one virtual store.
///
/// Separate facades should use separate stores (see
/// [`SandboxStore::ephemeral`](crate::store::SandboxStore::ephemeral)).
#[derive(Debug)]
pub struct GitSync {
    store: Arc<dyn VirtualStore>,
    client: RepositoryClient,
    mirror: DirectoryMirror,
    ignore: IgnoreList,
    transport: TransportOptions,
    provider: Option<Arc<dyn CredentialProvider>>,
    credentials: RwLock<Option<Credentials>>,
    repo: tokio::sync::RwLock<Option<RepoHandle>>,
    last_mirror: Mutex<MirrorStatus>,
    op_lock: tokio::sync::Mutex<()>,
}

impl GitSync {
    pub fn new(store: Arc<dyn VirtualStore>, config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            client: RepositoryClient::new(store.clone(), config.clone()),
            mirror: DirectoryMirror::new(store.clone(), config.mirror_concurrency()),
            ignore: IgnoreList::from_config(&config),
            transport: TransportOptions::from_config(&config),
            store,
            provider: None,
            credentials: RwLock::new(None),
            repo: tokio::sync::RwLock::new(None),
            last_mirror: Mutex::new(MirrorStatus::NotBound),
            op_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Consult `provider` when no bound credentials apply.
    pub fn with_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreList) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn store(&self) -> &Arc<dyn VirtualStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        self.client.config()
    }

    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    /// Token that cancels in-flight network operations of this facade.
    pub fn cancel_token(&self) -> CancelToken {
        self.transport.cancel.clone()
    }

    /// Snapshot of the current repository handle.
    pub async fn repo_handle(&self) -> Option<RepoHandle> {
        self.repo.read().await.clone()
    }

    /// Outcome of the most recent host mirroring.
    pub fn last_mirror_status(&self) -> MirrorStatus {
        self.last_mirror
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Bind credentials for this session. They are never persisted.
    pub fn bind_credentials(&self, credentials: Credentials) {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    /// Forget bound credentials (logout / lock).
    pub fn clear_credentials(&self) {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn resolve_credentials(
        &self,
        operation: &'static str,
        remote_url: Option<&str>,
    ) -> Result<Option<Credentials>, SyncError> {
        let bound = self
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(credentials) = bound {
            if remote_url.map_or(true, |url| credentials.applies_to(url)) {
                return Ok(Some(credentials));
            }
            tracing::debug!("bound credentials are scoped to another host");
        }

        match &self.provider {
            Some(provider) if provider.is_unlocked() => provider
                .get_credentials(remote_url)
                .map_err(SyncError::credential(operation)),
            Some(_) => {
                tracing::debug!("credential provider is locked");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remote_credentials(
        &self,
        operation: &'static str,
        handle: &RepoHandle,
    ) -> Result<Option<Credentials>, SyncError> {
        let url = match self.client.remote_url(&handle.root_path).await {
            Ok(Some(url)) => Some(url),
            _ => handle.remote.clone(),
        };
        self.resolve_credentials(operation, url.as_deref())
    }

    // =========================================================================
    // Binding
    // =========================================================================

    async fn current(&self, operation: &'static str) -> Result<RepoHandle, SyncError> {
        self.repo
            .read()
            .await
            .clone()
            .ok_or(SyncError::NoRepositoryBound { operation })
    }

    async fn set_current(&self, handle: RepoHandle) {
        tracing::debug!(root = %handle.root_path, mirrored = handle.is_mirrored(), "current repository");
        *self.repo.write().await = Some(handle);
    }

    /// Import a host directory into the store at `path` and make it current.
    ///
    /// `.git` is imported first with nothing ignored, then the working tree
    /// minus the ignore list. A host directory without `.git` imports its
    /// working tree only.
    pub async fn open_from_host_handle(
        &self,
        host: Arc<dyn HostDirectory>,
        path: &str,
    ) -> Result<MirrorReport, SyncError> {
        const OP: &str = "open";
        let _guard = self.op_lock.lock().await;
        let root = paths::normalize(path);
        let mut report = MirrorReport::default();

        match host.get_subdirectory(GIT_DIR, false).await {
            Ok(git_host) => {
                let git_path = paths::join(&[root.as_str(), GIT_DIR]);
                let metadata = self
                    .mirror
                    .import_from_host(git_host, &git_path, &IgnoreList::empty())
                    .await
                    .map_err(SyncError::mirror(OP))?;
                report.merge(metadata);
            }
            Err(HostError::NotFound { .. } | HostError::TypeMismatch { .. }) => {
                tracing::debug!(host = host.name(), "no .git directory, importing working tree only");
            }
            Err(e) => return Err(SyncError::host(OP)(e)),
        }

        let tree_ignore = self.ignore.clone().with(GIT_DIR);
        let tree = self
            .mirror
            .import_from_host(host.clone(), &root, &tree_ignore)
            .await
            .map_err(SyncError::mirror(OP))?;
        report.merge(tree);

        let remote = if self.client.is_git_repo(&root).await {
            self.client.remote_url(&root).await.ok().flatten()
        } else {
            None
        };
        self.set_current(RepoHandle {
            root_path: root.clone(),
            host: Some(host),
            host_segment: None,
            remote,
        })
        .await;

        tracing::info!(
            root = %root,
            files = report.files_copied,
            skipped = report.skipped.len(),
            "opened host directory"
        );
        self.record(MirrorStatus::Mirrored(report.clone()));
        Ok(report)
    }

    /// Make `path` the current repository without importing anything.
    pub async fn set_repo_dir(&self, path: &str, host: Option<Arc<dyn HostDirectory>>) {
        let mut handle = RepoHandle::new(path);
        handle.host = host;
        if self.client.is_git_repo(&handle.root_path).await {
            handle.remote = self.client.remote_url(&handle.root_path).await.ok().flatten();
        }
        self.set_current(handle).await;
    }

    /// Mirror the current repository to `host` (or its `segment`
    /// subdirectory) from now on.
    pub async fn bind_host(
        &self,
        host: Arc<dyn HostDirectory>,
        segment: Option<String>,
    ) -> Result<(), SyncError> {
        let mut repo = self.repo.write().await;
        let handle = repo
            .as_mut()
            .ok_or(SyncError::NoRepositoryBound { operation: "bind_host" })?;
        handle.host = Some(host);
        handle.host_segment = segment;
        Ok(())
    }

    /// Export the working tree and `.git` to the bound host directory.
    ///
    /// Unlike the implicit mirroring after operations, a failure at the
    /// export root is returned as an error.
    pub async fn sync_to_host(&self) -> Result<MirrorStatus, SyncError> {
        const OP: &str = "sync_to_host";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        if handle.host.is_none() {
            return Ok(self.record(MirrorStatus::NotBound));
        }
        let report = self
            .export(&handle, Scope::Full, None)
            .await
            .map_err(SyncError::mirror(OP))?;
        Ok(self.record(MirrorStatus::Mirrored(report)))
    }

    // =========================================================================
    // Mirroring
    // =========================================================================

    fn record(&self, status: MirrorStatus) -> MirrorStatus {
        *self.last_mirror.lock().unwrap_or_else(PoisonError::into_inner) = status.clone();
        status
    }

    /// Export to the bound host. With `before` (a [`DirectoryMirror::list_tree`]
    /// taken ahead of the operation), working tree entries the operation
    /// deleted are removed from the host first.
    async fn export(
        &self,
        handle: &RepoHandle,
        scope: Scope,
        before: Option<&BTreeSet<String>>,
    ) -> Result<MirrorReport, MirrorError> {
        let Some(host) = handle.host.clone() else {
            return Ok(MirrorReport::default());
        };
        let segment = handle.host_segment.as_deref();
        let mut report = MirrorReport::default();
        if let (Scope::Full, Some(before)) = (scope, before) {
            let after = self.mirror.list_tree(&handle.root_path, &self.ignore).await?;
            let removed: BTreeSet<String> = before.difference(&after).cloned().collect();
            if !removed.is_empty() {
                report.merge(self.mirror.prune_host(&removed, host.clone(), segment).await?);
            }
        }
        if scope == Scope::Full {
            report.merge(
                self.mirror
                    .export_to_host(&handle.root_path, host.clone(), segment, &self.ignore)
                    .await?,
            );
        }
        report.merge(
            self.mirror
                .export_metadata(&handle.root_path, host, segment)
                .await?,
        );
        Ok(report)
    }

    async fn mirror_after(&self, handle: &RepoHandle, scope: Scope) -> MirrorStatus {
        self.mirror_update(handle, scope, None).await
    }

    /// Working tree listing to diff against after an operation that may
    /// delete files. `None` when nothing is mirrored or the listing fails,
    /// in which case the host is not pruned.
    async fn tree_before(&self, handle: &RepoHandle) -> Option<BTreeSet<String>> {
        if !handle.is_mirrored() {
            return None;
        }
        match self.mirror.list_tree(&handle.root_path, &self.ignore).await {
            Ok(tree) => Some(tree),
            Err(e) => {
                tracing::warn!(root = %handle.root_path, "cannot list working tree, host will not be pruned: {e}");
                None
            }
        }
    }

    async fn mirror_update(
        &self,
        handle: &RepoHandle,
        scope: Scope,
        before: Option<&BTreeSet<String>>,
    ) -> MirrorStatus {
        if !handle.is_mirrored() {
            return self.record(MirrorStatus::NotBound);
        }
        let status = match self.export(handle, scope, before).await {
            Ok(report) => MirrorStatus::Mirrored(report),
            Err(e) => {
                tracing::warn!(root = %handle.root_path, "host mirroring failed: {e}");
                MirrorStatus::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };
        self.record(status)
    }

    async fn mirror_file(&self, handle: &RepoHandle, rel: &str, content: &[u8]) -> MirrorStatus {
        let Some(host) = handle.host.clone() else {
            return self.record(MirrorStatus::NotBound);
        };
        let status = match self
            .mirror
            .export_single_file(rel, content, host, handle.host_segment.as_deref())
            .await
        {
            Ok(()) => MirrorStatus::Mirrored(MirrorReport {
                files_copied: 1,
                ..MirrorReport::default()
            }),
            Err(e) => {
                tracing::warn!(path = rel, "store write succeeded but host mirroring failed: {e}");
                MirrorStatus::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };
        self.record(status)
    }

    // =========================================================================
    // Repository lifecycle
    // =========================================================================

    /// Clone `url` under `target_dir` and make it current.
    ///
    /// With `host`, the clone is mirrored into a subdirectory of `host`
    /// named after the repository, which stays bound.
    pub async fn clone(
        &self,
        url: &str,
        target_dir: &str,
        options: &CloneOptions,
        host: Option<Arc<dyn HostDirectory>>,
    ) -> Result<String, SyncError> {
        const OP: &str = "clone";
        let _guard = self.op_lock.lock().await;
        let credentials = self.resolve_credentials(OP, Some(url))?;
        let root = self
            .client
            .clone(url, target_dir, options, credentials, &self.transport)
            .await
            .map_err(SyncError::git(OP))?;

        let handle = RepoHandle {
            host_segment: host.as_ref().map(|_| paths::basename(&root)),
            host,
            root_path: root.clone(),
            remote: Some(url.to_string()),
        };
        self.set_current(handle.clone()).await;
        self.mirror_after(&handle, Scope::Full).await;
        Ok(root)
    }

    /// Create a repository at `dir` and make it current.
    ///
    /// If `dir` is already the current root, its host binding is kept.
    pub async fn init(&self, dir: &str, with_initial_commit: bool) -> Result<(), SyncError> {
        const OP: &str = "init";
        let _guard = self.op_lock.lock().await;
        let root = paths::normalize(dir);
        self.client
            .init(&root, with_initial_commit)
            .await
            .map_err(SyncError::git(OP))?;

        let mut handle = match self.repo.read().await.clone() {
            Some(previous) if previous.root_path == root => previous,
            _ => RepoHandle::new(&root),
        };
        handle.remote = self.client.remote_url(&root).await.ok().flatten();
        self.set_current(handle.clone()).await;
        self.mirror_after(&handle, Scope::Full).await;
        Ok(())
    }

    /// Whether `dir` is a repository root. Needs no current repository.
    pub async fn is_git_repo(&self, dir: &str) -> bool {
        self.client.is_git_repo(&paths::normalize(dir)).await
    }

    /// Write `.gitignore` at the root from a template, merging with any
    /// existing file.
    pub async fn create_gitignore(
        &self,
        template: &GitignoreTemplate,
    ) -> Result<MirrorStatus, SyncError> {
        const OP: &str = "create_gitignore";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        self.client
            .create_gitignore(&handle.root_path, template)
            .await
            .map_err(SyncError::git(OP))?;

        let (full, rel) = handle.resolve(OP, ".gitignore")?;
        let content = self.store.read_file(&full).await.map_err(SyncError::store(OP))?;
        Ok(self.mirror_file(&handle, &rel, &content).await)
    }

    // =========================================================================
    // Network
    // =========================================================================

    pub async fn fetch(&self) -> Result<(), SyncError> {
        const OP: &str = "fetch";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        let credentials = self.remote_credentials(OP, &handle).await?;
        self.client
            .fetch(&handle.root_path, credentials, &self.transport)
            .await
            .map_err(SyncError::git(OP))?;
        self.mirror_after(&handle, Scope::Metadata).await;
        Ok(())
    }

    pub async fn pull(&self) -> Result<PullOutcome, SyncError> {
        const OP: &str = "pull";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        let credentials = self.remote_credentials(OP, &handle).await?;
        let before = self.tree_before(&handle).await;
        let outcome = self
            .client
            .pull(&handle.root_path, credentials, &self.transport)
            .await
            .map_err(SyncError::git(OP))?;

        let scope = match outcome {
            PullOutcome::UpToDate => Scope::Metadata,
            _ => Scope::Full,
        };
        self.mirror_update(&handle, scope, before.as_ref()).await;
        Ok(outcome)
    }

    pub async fn push(&self) -> Result<(), SyncError> {
        const OP: &str = "push";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        let credentials = self.remote_credentials(OP, &handle).await?;
        self.client
            .push(&handle.root_path, credentials, &self.transport)
            .await
            .map_err(SyncError::git(OP))?;
        self.mirror_after(&handle, Scope::Metadata).await;
        Ok(())
    }

    // =========================================================================
    // Index and history
    // =========================================================================

    pub async fn add(&self, filepath: &str) -> Result<(), SyncError> {
        const OP: &str = "add";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        self.client
            .add(&handle.root_path, filepath)
            .await
            .map_err(SyncError::git(OP))?;
        self.mirror_after(&handle, Scope::Metadata).await;
        Ok(())
    }

    pub async fn commit(&self, message: &str, author: Option<Author>) -> Result<Oid, SyncError> {
        const OP: &str = "commit";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        let oid = self
            .client
            .commit(&handle.root_path, message, author)
            .await
            .map_err(SyncError::git(OP))?;
        self.mirror_after(&handle, Scope::Metadata).await;
        Ok(oid)
    }

    pub async fn checkout(&self, reference: &str) -> Result<(), SyncError> {
        const OP: &str = "checkout";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        let before = self.tree_before(&handle).await;
        self.client
            .checkout(&handle.root_path, reference)
            .await
            .map_err(SyncError::git(OP))?;
        self.mirror_update(&handle, Scope::Full, before.as_ref()).await;
        Ok(())
    }

    /// Fresh status of the current repository.
    pub async fn status(&self) -> Result<GitStatus, SyncError> {
        let handle = self.current("status").await?;
        self.client
            .status(&handle.root_path)
            .await
            .map_err(SyncError::git("status"))
    }

    pub async fn get_current_branch(&self) -> Result<String, SyncError> {
        let handle = self.current("get_current_branch").await?;
        self.client
            .current_branch(&handle.root_path)
            .await
            .map_err(SyncError::git("get_current_branch"))
    }

    pub async fn list_branches(&self) -> Result<Vec<String>, SyncError> {
        let handle = self.current("list_branches").await?;
        self.client
            .list_branches(&handle.root_path)
            .await
            .map_err(SyncError::git("list_branches"))
    }

    pub async fn log(&self, count: usize) -> Result<Vec<Commit>, SyncError> {
        let handle = self.current("log").await?;
        self.client
            .log(&handle.root_path, count)
            .await
            .map_err(SyncError::git("log"))
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Root-relative paths of working tree files whose extension is in
    /// `extensions` (any file when empty), sorted.
    ///
    /// Extensions match case-insensitively, with or without the leading
    /// dot. `.git` and ignored directories are not walked.
    pub async fn get_repo_files(&self, extensions: &[&str]) -> Result<Vec<String>, SyncError> {
        const OP: &str = "get_repo_files";
        let handle = self.current(OP).await?;
        let wanted: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        let mut files = Vec::new();
        let mut stack = vec![String::new()];
        while let Some(rel) = stack.pop() {
            let dir = paths::join(&[handle.root_path.as_str(), rel.as_str()]);
            let names = self.store.readdir(&dir).await.map_err(SyncError::store(OP))?;
            for name in names {
                if name == GIT_DIR || self.ignore.is_ignored(&name) {
                    continue;
                }
                let child_rel = paths::join(&[rel.as_str(), name.as_str()]);
                let stat = self
                    .store
                    .stat(&paths::join(&[dir.as_str(), name.as_str()]))
                    .await
                    .map_err(SyncError::store(OP))?;
                if stat.is_directory {
                    stack.push(child_rel);
                } else if stat.is_file && matches_extension(&name, &wanted) {
                    files.push(child_rel);
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read a file of the current repository.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, SyncError> {
        const OP: &str = "read_file";
        let handle = self.current(OP).await?;
        let (full, _) = handle.resolve(OP, path)?;
        self.store.read_file(&full).await.map_err(SyncError::store(OP))
    }

    /// Write a file of the current repository, then mirror just that file.
    ///
    /// The store write completes first. A mirroring failure leaves it in
    /// place and is reported in the returned status, not as an error.
    pub async fn write_file(&self, path: &str, content: &[u8]) -> Result<MirrorStatus, SyncError> {
        const OP: &str = "write_file";
        let _guard = self.op_lock.lock().await;
        let handle = self.current(OP).await?;
        let (full, rel) = handle.resolve(OP, path)?;

        self.store
            .mkdir(&paths::dirname(&full), true)
            .await
            .map_err(SyncError::store(OP))?;
        self.store
            .write_file(&full, content)
            .await
            .map_err(SyncError::store(OP))?;
        Ok(self.mirror_file(&handle, &rel, content).await)
    }
}

fn matches_extension(name: &str, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let ext = paths::extname(name);
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    !ext.is_empty() && wanted.iter().any(|w| *w == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::host::MemoryHostDirectory;
    use crate::store::SandboxStore;
    use tempfile::TempDir;

    fn facade() -> (TempDir, GitSync) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn VirtualStore> =
            Arc::new(SandboxStore::new(dir.path().join("sandbox")).unwrap());
        (dir, GitSync::new(store, Config::default()))
    }

    #[test]
    fn extension_matching() {
        let wanted = vec!["md".to_string(), "rs".to_string()];
        assert!(matches_extension("README.MD", &wanted));
        assert!(matches_extension("lib.rs", &wanted));
        assert!(!matches_extension("a.txt", &wanted));
        assert!(!matches_extension(".md", &wanted));
        assert!(matches_extension("anything", &[]));
    }

    mod unbound {
        use super::*;

        #[tokio::test]
        async fn operations_fail_fast() {
            let (_dir, sync) = facade();
            assert_eq!(
                sync.status().await.unwrap_err().kind(),
                ErrorKind::NoRepositoryBound
            );
            let err = sync.write_file("a.txt", b"a").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NoRepositoryBound);
            assert_eq!(err.operation(), "write_file");
            assert!(!sync.store().exists("/a.txt").await.unwrap());
            assert!(sync.push().await.is_err());
            assert!(sync.get_repo_files(&[]).await.is_err());
            assert!(sync
                .bind_host(MemoryHostDirectory::new("h").shared(), None)
                .await
                .is_err());
        }
    }

    mod files {
        use super::*;

        #[tokio::test]
        async fn write_read_and_list() {
            let (_dir, sync) = facade();
            sync.init("/repo", true).await.unwrap();

            let status = sync.write_file("docs/guide.md", b"guide").await.unwrap();
            assert_eq!(status, MirrorStatus::NotBound);
            sync.write_file("src/main.rs", b"fn main() {}").await.unwrap();
            sync.store().mkdir("/repo/node_modules/x", true).await.unwrap();
            sync.store()
                .write_file("/repo/node_modules/x/pkg.md", b"noise")
                .await
                .unwrap();

            assert_eq!(sync.read_file("/repo/docs/guide.md").await.unwrap(), b"guide");
            assert_eq!(
                sync.get_repo_files(&[".md"]).await.unwrap(),
                vec!["README.md", "docs/guide.md"]
            );
            assert_eq!(
                sync.get_repo_files(&["RS"]).await.unwrap(),
                vec!["src/main.rs"]
            );
        }

        #[tokio::test]
        async fn write_mirrors_single_file() {
            let (_dir, sync) = facade();
            let host = MemoryHostDirectory::new("proj");
            sync.init("/repo", false).await.unwrap();
            sync.bind_host(host.shared(), None).await.unwrap();

            let status = sync.write_file("a/b.txt", b"hi").await.unwrap();
            assert!(matches!(status, MirrorStatus::Mirrored(ref r) if r.files_copied == 1));
            assert_eq!(host.read("a/b.txt").as_deref(), Some(&b"hi"[..]));
        }

        #[tokio::test]
        async fn mirror_failure_is_not_an_error() {
            let (_dir, sync) = facade();
            let host = MemoryHostDirectory::new("proj");
            host.insert_file("locked.txt", b"old".to_vec()).unwrap();
            host.set_read_only("locked.txt");
            sync.init("/repo", false).await.unwrap();
            sync.bind_host(host.shared(), None).await.unwrap();

            let status = sync.write_file("locked.txt", b"new").await.unwrap();
            assert!(status.is_failed());
            assert_eq!(sync.read_file("locked.txt").await.unwrap(), b"new");
            assert_eq!(host.read("locked.txt").as_deref(), Some(&b"old"[..]));
            assert!(sync.last_mirror_status().is_failed());
        }
    }

    mod credentials {
        use super::*;
        use crate::credentials::StaticCredentialProvider;

        #[test]
        fn bound_credentials_win_when_scope_matches() {
            let (_dir, sync) = facade();
            let sync = sync.with_provider(Arc::new(StaticCredentialProvider::new(
                Credentials::new("provider", "p"),
            )));

            sync.bind_credentials(
                Credentials::new("bound", "b").scoped_to("https://github.com/a/b"),
            );
            let github = sync
                .resolve_credentials("push", Some("https://github.com/c/d"))
                .unwrap()
                .unwrap();
            assert_eq!(github.username, "bound");

            let other = sync
                .resolve_credentials("push", Some("https://gitlab.com/c/d"))
                .unwrap()
                .unwrap();
            assert_eq!(other.username, "provider");

            sync.clear_credentials();
            assert!(!sync.has_credentials());
        }

        #[test]
        fn anonymous_without_any_source() {
            let (_dir, sync) = facade();
            assert!(sync
                .resolve_credentials("clone", Some("https://example.com/r"))
                .unwrap()
                .is_none());
        }
    }

    mod lifecycle {
        use super::*;

        #[tokio::test]
        async fn init_keeps_host_binding_for_same_root() {
            let (_dir, sync) = facade();
            let host = MemoryHostDirectory::new("proj");
            sync.set_repo_dir("/repo", Some(host.shared())).await;
            sync.init("/repo", true).await.unwrap();

            let handle = sync.repo_handle().await.unwrap();
            assert!(handle.is_mirrored());
            assert!(host.contains("README.md"));
            assert!(host.contains(".git/HEAD"));
            assert_eq!(sync.get_current_branch().await.unwrap(), "main");
        }

        #[tokio::test]
        async fn checkout_removes_deleted_files_from_host() {
            let (_dir, sync) = facade();
            let host = MemoryHostDirectory::new("proj");
            sync.set_repo_dir("/repo", Some(host.shared())).await;
            sync.init("/repo", true).await.unwrap();
            let first = sync.log(1).await.unwrap()[0].oid.clone();

            sync.write_file("a.txt", b"a").await.unwrap();
            sync.add(".").await.unwrap();
            sync.commit("Add a", None).await.unwrap();
            host.insert_file("scratch.txt", "host only").unwrap();
            host.insert_file("node_modules/dep/index.js", "x").unwrap();
            assert!(host.contains("a.txt"));

            sync.checkout(first.as_str()).await.unwrap();

            assert!(!sync.store().exists("/repo/a.txt").await.unwrap());
            assert!(!host.contains("a.txt"));
            assert!(host.contains("README.md"));
            assert!(host.contains("scratch.txt"));
            assert!(host.contains("node_modules/dep/index.js"));
            match sync.last_mirror_status() {
                MirrorStatus::Mirrored(report) => assert_eq!(report.removed, 1),
                other => panic!("unexpected mirror status: {other:?}"),
            }
        }

        #[tokio::test]
        async fn gitignore_is_mirrored() {
            let (_dir, sync) = facade();
            let host = MemoryHostDirectory::new("proj");
            sync.init("/repo", false).await.unwrap();
            sync.bind_host(host.shared(), None).await.unwrap();

            sync.create_gitignore(&GitignoreTemplate::Custom("out/".into()))
                .await
                .unwrap();
            assert_eq!(host.read(".gitignore").as_deref(), Some(&b"out/\n"[..]));
        }
    }
}
