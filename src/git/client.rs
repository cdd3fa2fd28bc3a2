//! git::client
//!
//! Repository operations over a virtual store.
//!
//! # Design
//!
//! Every method takes the repository root as a virtual store path. The
//! path is mapped to disk with [`VirtualStore::local_path`] and the engine
//! call runs on the blocking pool with a freshly opened repository.
//!
//! Files the client creates itself (the `init` seed file, `.gitignore`) are
//! written through the store like any other caller's writes.
//!
//! # Branch resolution
//!
//! Operations that need the checked-out branch read it from HEAD. On an
//! unborn HEAD the branch HEAD points at is used (so a fresh clone of a
//! `trunk` repository stays on `trunk`); only when HEAD is detached or
//! unreadable does the configured default branch apply.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::Repository;
use serde::Serialize;

use super::transport::TransportSession;
use super::{GitError, TransportOptions};
use crate::core::config::Config;
use crate::core::naming;
use crate::core::paths;
use crate::core::types::{
    Author, BranchName, CloneOptions, Commit, Credentials, GitStatus, GitignoreTemplate, Oid,
};
use crate::store::{StoreError, VirtualStore};

/// What `pull` did to the checked-out branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PullOutcome {
    /// Remote had nothing new, or no remote branch exists yet.
    UpToDate,
    /// Branch moved forward to the remote commit.
    FastForward { commit: Oid },
    /// Unborn branch adopted the remote commit.
    Adopted { commit: Oid },
    /// Diverged histories joined with a merge commit.
    Merged { commit: Oid },
}

/// Git engine client bound to a store.
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    store: Arc<dyn VirtualStore>,
    config: Arc<Config>,
}

impl RepositoryClient {
    pub fn new(store: Arc<dyn VirtualStore>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn local(&self, dir: &str) -> Result<PathBuf, GitError> {
        Ok(self.store.local_path(dir)?)
    }

    async fn with_repo<T, F>(&self, dir: &str, task: F) -> Result<T, GitError>
    where
        F: FnOnce(&Repository) -> Result<T, GitError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.local(dir)?;
        run_blocking(move || {
            let repo = open_repo(&path)?;
            task(&repo)
        })
        .await
    }

    // =========================================================================
    // Network operations
    // =========================================================================

    /// Clone `url` into `<parent_dir>/<repo name>` and return that path.
    ///
    /// The name is the URL's last path segment without `.git`. Existing
    /// content at the target is removed first, so cloning twice leaves the
    /// same tree as cloning once. A failed clone leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Transport failures are reclassified, see [`super::transport`].
    pub async fn clone(
        &self,
        url: &str,
        parent_dir: &str,
        options: &CloneOptions,
        credentials: Option<Credentials>,
        transport: &TransportOptions,
    ) -> Result<String, GitError> {
        let name = naming::repo_name_from_url(url).ok_or_else(|| GitError::InvalidInput {
            message: format!("cannot derive a repository name from '{url}'"),
        })?;
        let root = paths::join(&[parent_dir, name.as_str()]);
        TransportSession::new(transport, credentials.as_ref()).ensure_active()?;

        if self.store.exists(&root).await? {
            tracing::debug!(path = %root, "removing previous clone");
            self.store.rmdir(&root, true).await?;
        }
        self.store.mkdir(parent_dir, true).await?;
        let local = self.local(&root)?;

        let url_owned = url.to_string();
        let options = options.clone();
        let transport = transport.clone();
        run_blocking(move || {
            let session = TransportSession::new(&transport, credentials.as_ref());
            session.ensure_active()?;

            let branch = match (&options.reference, options.single_branch) {
                (Some(reference), _) => Some(reference.clone()),
                (None, true) => {
                    let default = remote_default_branch(&url_owned, &session)?;
                    session.reset_auth();
                    default
                }
                (None, false) => None,
            };

            let mut fetch = session.fetch_options();
            if let Some(depth) = options.depth {
                fetch.depth(i32::try_from(depth).unwrap_or(i32::MAX));
            }
            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch);
            if let Some(branch) = &branch {
                builder.branch(branch);
            }
            if let (true, Some(branch)) = (options.single_branch, branch.clone()) {
                builder.remote_create(move |repo, name, url| {
                    let refspec = format!("+refs/heads/{branch}:refs/remotes/{name}/{branch}");
                    repo.remote_with_fetch(name, url, &refspec)
                });
            }

            match builder.clone(&url_owned, &local) {
                Ok(_) => Ok(()),
                Err(e) => {
                    let _ = std::fs::remove_dir_all(&local);
                    Err(session.classify(e))
                }
            }
        })
        .await?;

        tracing::info!(path = %root, "clone complete");
        Ok(root)
    }

    /// Fetch from the configured remote.
    pub async fn fetch(
        &self,
        dir: &str,
        credentials: Option<Credentials>,
        transport: &TransportOptions,
    ) -> Result<(), GitError> {
        let remote = self.config.remote().to_string();
        let transport = transport.clone();
        self.with_repo(dir, move |repo| {
            let session = TransportSession::new(&transport, credentials.as_ref());
            fetch_remote(repo, &remote, &session)
        })
        .await
    }

    /// Push the checked-out branch to the same name on the configured remote.
    ///
    /// # Errors
    ///
    /// - [`GitError::PermissionDenied`] if the remote rejects the update
    /// - [`GitError::NotFound`] if the remote is not configured
    pub async fn push(
        &self,
        dir: &str,
        credentials: Option<Credentials>,
        transport: &TransportOptions,
    ) -> Result<(), GitError> {
        let remote_name = self.config.remote().to_string();
        let fallback = self.config.default_branch().to_string();
        let transport = transport.clone();
        self.with_repo(dir, move |repo| {
            let branch = resolve_branch(repo, &fallback)?;
            let mut remote = find_remote(repo, &remote_name)?;
            let session = TransportSession::new(&transport, credentials.as_ref());
            session.ensure_active()?;

            let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
            let mut options = session.push_options();
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| session.classify(e))?;

            let rejected = session.take_rejections();
            if !rejected.is_empty() {
                return Err(GitError::PermissionDenied {
                    message: rejected.join("; "),
                });
            }
            tracing::info!(branch = %branch, remote = %remote_name, "push complete");
            Ok(())
        })
        .await
    }

    /// Fetch, then integrate `<remote>/<branch>` into the checked-out branch.
    ///
    /// Working tree updates use a safe checkout: local edits that would be
    /// overwritten fail the pull with [`GitError::Conflict`] and nothing
    /// moves. Content conflicts in a merge fail the same way, before the
    /// index or working tree is touched.
    pub async fn pull(
        &self,
        dir: &str,
        credentials: Option<Credentials>,
        transport: &TransportOptions,
    ) -> Result<PullOutcome, GitError> {
        let remote_name = self.config.remote().to_string();
        let fallback = self.config.default_branch().to_string();
        let author = self.default_author();
        let transport = transport.clone();
        self.with_repo(dir, move |repo| {
            let branch = resolve_branch(repo, &fallback)?;
            let session = TransportSession::new(&transport, credentials.as_ref());
            fetch_remote(repo, &remote_name, &session)?;

            let tracking = format!("refs/remotes/{remote_name}/{branch}");
            let fetched = match repo.find_reference(&tracking) {
                Ok(reference) => reference,
                Err(e) if e.code() == git2::ErrorCode::NotFound => {
                    return Ok(PullOutcome::UpToDate)
                }
                Err(e) => return Err(GitError::from_git2(e, &tracking)),
            };
            let annotated = repo.reference_to_annotated_commit(&fetched)?;
            let (analysis, _) = repo.merge_analysis(&[&annotated])?;
            let target = annotated.id();
            let local_ref = format!("refs/heads/{branch}");

            if analysis.is_up_to_date() {
                Ok(PullOutcome::UpToDate)
            } else if analysis.is_unborn() {
                let commit = repo.find_commit(target)?;
                checkout_safe(repo, commit.as_object())?;
                repo.reference(&local_ref, target, true, "pull: initial")?;
                repo.set_head(&local_ref)?;
                Ok(PullOutcome::Adopted {
                    commit: to_oid(target)?,
                })
            } else if analysis.is_fast_forward() {
                let commit = repo.find_commit(target)?;
                checkout_safe(repo, commit.as_object())?;
                repo.find_reference(&local_ref)
                    .map_err(|e| GitError::from_git2(e, &local_ref))?
                    .set_target(target, "pull: fast-forward")?;
                Ok(PullOutcome::FastForward {
                    commit: to_oid(target)?,
                })
            } else if analysis.is_normal() {
                let ours = repo.head()?.peel_to_commit()?;
                let theirs = repo.find_commit(target)?;
                let mut merged = repo.merge_commits(&ours, &theirs, None)?;
                if merged.has_conflicts() {
                    return Err(GitError::Conflict {
                        paths: conflict_paths(&merged)?,
                    });
                }

                let tree = repo.find_tree(merged.write_tree_to(repo)?)?;
                let signature = signature(&author)?;
                let message = format!("Merge remote-tracking branch '{remote_name}/{branch}'");
                let merge_id = repo.commit(
                    None,
                    &signature,
                    &signature,
                    &message,
                    &tree,
                    &[&ours, &theirs],
                )?;
                let merge_commit = repo.find_commit(merge_id)?;
                checkout_safe(repo, merge_commit.as_object())?;
                repo.find_reference(&local_ref)
                    .map_err(|e| GitError::from_git2(e, &local_ref))?
                    .set_target(merge_id, "pull: merge")?;
                Ok(PullOutcome::Merged {
                    commit: to_oid(merge_id)?,
                })
            } else {
                Err(GitError::Internal {
                    message: format!("cannot integrate {tracking} into {local_ref}"),
                })
            }
        })
        .await
    }

    // =========================================================================
    // Working tree and index
    // =========================================================================

    /// Bucket every non-ignored path under the root by state.
    pub async fn status(&self, dir: &str) -> Result<GitStatus, GitError> {
        self.with_repo(dir, |repo| {
            let mut opts = git2::StatusOptions::new();
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .include_ignored(false)
                .exclude_submodules(true);

            let statuses = repo
                .statuses(Some(&mut opts))
                .map_err(|e| GitError::from_git2(e, "status"))?;

            let mut result = GitStatus::default();
            for entry in statuses.iter() {
                let Some(path) = entry.path() else {
                    continue;
                };
                let status = entry.status();

                if status.is_index_new()
                    || status.is_index_modified()
                    || status.is_index_deleted()
                    || status.is_index_renamed()
                    || status.is_index_typechange()
                {
                    result.staged.push(path.to_string());
                }

                if status.is_wt_modified()
                    || status.is_wt_deleted()
                    || status.is_wt_renamed()
                    || status.is_wt_typechange()
                    || status.is_conflicted()
                {
                    result.modified.push(path.to_string());
                }

                if status.is_wt_new() {
                    result.untracked.push(path.to_string());
                }
            }

            result.staged.sort();
            result.modified.sort();
            result.untracked.sort();
            Ok(result)
        })
        .await
    }

    /// Stage a path relative to the root (or absolute inside it).
    ///
    /// A directory stages everything beneath it, `.` stages the whole tree,
    /// and a tracked path that no longer exists stages its deletion.
    pub async fn add(&self, dir: &str, filepath: &str) -> Result<(), GitError> {
        let rel = repo_relative(dir, filepath)?;
        self.with_repo(dir, move |repo| {
            let workdir = repo.workdir().ok_or_else(|| GitError::InvalidInput {
                message: "bare repositories have no working tree".to_string(),
            })?;
            let full = workdir.join(&rel);
            let mut index = repo.index()?;

            if rel.is_empty() || full.is_dir() {
                let spec = if rel.is_empty() { "*" } else { rel.as_str() };
                index.add_all([spec], git2::IndexAddOption::DEFAULT, None)?;
                index.update_all([spec], None)?;
            } else if full.exists() {
                index
                    .add_path(Path::new(&rel))
                    .map_err(|e| GitError::from_git2(e, &rel))?;
            } else if index.get_path(Path::new(&rel), 0).is_some() {
                index.remove_path(Path::new(&rel))?;
            } else {
                return Err(GitError::NotFound { what: rel });
            }

            index.write()?;
            Ok(())
        })
        .await
    }

    /// Record the index as a new commit on the checked-out branch.
    ///
    /// Without `author`, the configured default author is used for both
    /// author and committer.
    pub async fn commit(
        &self,
        dir: &str,
        message: &str,
        author: Option<Author>,
    ) -> Result<Oid, GitError> {
        let author = author.unwrap_or_else(|| self.default_author());
        let message = message.to_string();
        self.with_repo(dir, move |repo| {
            let signature = signature(&author)?;
            let mut index = repo.index()?;
            let tree = repo.find_tree(index.write_tree()?)?;

            let parent = match repo.head() {
                Ok(head) => Some(head.peel_to_commit()?),
                Err(e) if is_unborn(&e) => None,
                Err(e) => return Err(GitError::from_git2(e, "HEAD")),
            };
            let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

            let id = repo.commit(
                Some("HEAD"),
                &signature,
                &signature,
                &message,
                &tree,
                &parents,
            )?;
            tracing::debug!(commit = %id, "created commit");
            to_oid(id)
        })
        .await
    }

    // =========================================================================
    // Branches and history
    // =========================================================================

    /// The checked-out branch name, never failing on an unborn HEAD.
    pub async fn current_branch(&self, dir: &str) -> Result<String, GitError> {
        let fallback = self.config.default_branch().to_string();
        self.with_repo(dir, move |repo| resolve_branch(repo, &fallback))
            .await
    }

    /// Local branch names, sorted.
    pub async fn list_branches(&self, dir: &str) -> Result<Vec<String>, GitError> {
        self.with_repo(dir, |repo| {
            let branches = repo
                .branches(Some(git2::BranchType::Local))
                .map_err(|e| GitError::from_git2(e, "branches"))?;

            let mut names = Vec::new();
            for branch in branches {
                let (branch, _) = branch?;
                if let Some(name) = branch.name().ok().flatten() {
                    names.push(name.to_string());
                }
            }
            names.sort();
            Ok(names)
        })
        .await
    }

    /// Switch to a branch, remote branch, or commit.
    ///
    /// Resolution order: local branch, `<remote>/<ref>` (a local tracking
    /// branch is created), then any revision (detached HEAD).
    pub async fn checkout(&self, dir: &str, reference: &str) -> Result<(), GitError> {
        let remote = self.config.remote().to_string();
        let reference = reference.to_string();
        self.with_repo(dir, move |repo| {
            let local_ref = format!("refs/heads/{reference}");
            if let Ok(existing) = repo.find_reference(&local_ref) {
                let commit = existing.peel_to_commit()?;
                checkout_safe(repo, commit.as_object())?;
                repo.set_head(&local_ref)?;
                return Ok(());
            }

            let remote_ref = format!("refs/remotes/{remote}/{reference}");
            if let Ok(tracking) = repo.find_reference(&remote_ref) {
                let name = BranchName::new(reference.as_str())?;
                let commit = tracking.peel_to_commit()?;
                checkout_safe(repo, commit.as_object())?;
                let mut branch = repo.branch(name.as_str(), &commit, false)?;
                let upstream = format!("{remote}/{reference}");
                branch.set_upstream(Some(upstream.as_str()))?;
                repo.set_head(&local_ref)?;
                tracing::debug!(branch = %name, "created tracking branch");
                return Ok(());
            }

            let object = repo
                .revparse_single(&reference)
                .map_err(|_| GitError::NotFound {
                    what: reference.clone(),
                })?;
            let commit = object.peel_to_commit()?;
            checkout_safe(repo, commit.as_object())?;
            repo.set_head_detached(commit.id())?;
            Ok(())
        })
        .await
    }

    /// Up to `count` commits reachable from HEAD, newest first. Empty on an
    /// unborn HEAD.
    pub async fn log(&self, dir: &str, count: usize) -> Result<Vec<Commit>, GitError> {
        self.with_repo(dir, move |repo| {
            // push_head reports an unborn HEAD as a generic reference error
            match repo.head() {
                Ok(_) => {}
                Err(e) if is_unborn(&e) => return Ok(Vec::new()),
                Err(e) => return Err(GitError::from_git2(e, "HEAD")),
            }
            let mut walk = repo.revwalk()?;
            walk.push_head()
                .map_err(|e| GitError::from_git2(e, "HEAD"))?;
            walk.set_sorting(git2::Sort::TIME)?;

            walk.take(count)
                .map(|id| {
                    let commit = repo.find_commit(id?)?;
                    commit_info(&commit)
                })
                .collect()
        })
        .await
    }

    // =========================================================================
    // Repository lifecycle
    // =========================================================================

    /// Create a repository at `dir` on the configured default branch.
    ///
    /// With `with_initial_commit`, a seed file is written (unless present)
    /// and committed, provided the repository has no commits yet.
    pub async fn init(&self, dir: &str, with_initial_commit: bool) -> Result<(), GitError> {
        self.store.mkdir(dir, true).await?;
        let local = self.local(dir)?;
        let branch = self.config.default_branch().to_string();
        run_blocking(move || {
            let mut opts = git2::RepositoryInitOptions::new();
            opts.initial_head(&branch);
            Repository::init_opts(&local, &opts).map_err(|e| GitError::from_git2(e, "init"))?;
            Ok(())
        })
        .await?;

        if with_initial_commit && self.log(dir, 1).await?.is_empty() {
            let seed = self.config.seed_file();
            let seed_path = paths::join(&[dir, seed]);
            if !self.store.exists(&seed_path).await? {
                let title = match paths::basename(dir) {
                    name if name.is_empty() => "repository".to_string(),
                    name => name,
                };
                self.store
                    .write_file(&seed_path, format!("# {title}\n").as_bytes())
                    .await?;
            }
            self.add(dir, seed).await?;
            self.commit(dir, self.config.seed_message(), None).await?;
        }

        tracing::info!(path = dir, "initialized repository");
        Ok(())
    }

    /// Whether `dir` is the root of a repository.
    pub async fn is_git_repo(&self, dir: &str) -> bool {
        let Ok(local) = self.local(dir) else {
            return false;
        };
        tokio::task::spawn_blocking(move || Repository::open(local).is_ok())
            .await
            .unwrap_or(false)
    }

    /// Write `.gitignore` at the root from a template.
    ///
    /// An existing file keeps its content; template lines it lacks are
    /// appended.
    pub async fn create_gitignore(
        &self,
        dir: &str,
        template: &GitignoreTemplate,
    ) -> Result<(), GitError> {
        let path = paths::join(&[dir, ".gitignore"]);
        let content = template.content();

        let merged = match self.store.read_file(&path).await {
            Ok(existing) => {
                let mut existing = String::from_utf8_lossy(&existing).into_owned();
                let missing: Vec<&str> = content
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .filter(|line| !existing.lines().any(|e| e.trim() == line.trim()))
                    .collect();
                if missing.is_empty() {
                    return Ok(());
                }
                if !existing.is_empty() && !existing.ends_with('\n') {
                    existing.push('\n');
                }
                for line in missing {
                    existing.push_str(line);
                    existing.push('\n');
                }
                existing
            }
            Err(StoreError::NotFound { .. }) => content,
            Err(e) => return Err(e.into()),
        };

        self.store.write_file(&path, merged.as_bytes()).await?;
        Ok(())
    }

    /// URL of the configured remote, if any.
    pub async fn remote_url(&self, dir: &str) -> Result<Option<String>, GitError> {
        let name = self.config.remote().to_string();
        self.with_repo(dir, move |repo| match repo.find_remote(&name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, &name)),
        })
        .await
    }

    fn default_author(&self) -> Author {
        Author::now(self.config.author_name(), self.config.author_email())
    }
}

// =============================================================================
// Helpers (run inside blocking tasks)
// =============================================================================

async fn run_blocking<T, F>(task: F) -> Result<T, GitError>
where
    F: FnOnce() -> Result<T, GitError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| GitError::Internal {
            message: format!("git task failed: {e}"),
        })?
}

fn open_repo(path: &Path) -> Result<Repository, GitError> {
    let repo = Repository::open(path).map_err(|_| GitError::NotARepo {
        path: path.to_path_buf(),
    })?;
    if repo.is_bare() {
        return Err(GitError::InvalidInput {
            message: format!("{} is a bare repository", path.display()),
        });
    }
    Ok(repo)
}

fn is_unborn(err: &git2::Error) -> bool {
    matches!(
        err.code(),
        git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
    )
}

fn resolve_branch(repo: &Repository, fallback: &str) -> Result<String, GitError> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head
            .shorthand()
            .map(String::from)
            .unwrap_or_else(|| fallback.to_string())),
        // detached
        Ok(_) => Ok(fallback.to_string()),
        Err(e) if is_unborn(&e) => {
            let unborn = repo.find_reference("HEAD").ok().and_then(|head| {
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(String::from)
            });
            Ok(unborn.unwrap_or_else(|| fallback.to_string()))
        }
        Err(e) => Err(GitError::from_git2(e, "HEAD")),
    }
}

fn find_remote<'r>(repo: &'r Repository, name: &str) -> Result<git2::Remote<'r>, GitError> {
    repo.find_remote(name)
        .map_err(|e| GitError::from_git2(e, &format!("remote '{name}'")))
}

fn fetch_remote(
    repo: &Repository,
    remote_name: &str,
    session: &TransportSession<'_>,
) -> Result<(), GitError> {
    let mut remote = find_remote(repo, remote_name)?;
    session.ensure_active()?;
    let mut options = session.fetch_options();
    remote
        .fetch(&[] as &[&str], Some(&mut options), None)
        .map_err(|e| session.classify(e))
}

/// Ask the remote which branch its HEAD points at.
fn remote_default_branch(
    url: &str,
    session: &TransportSession<'_>,
) -> Result<Option<String>, GitError> {
    let mut remote = git2::Remote::create_detached(url)?;
    let mut connection = remote
        .connect_auth(git2::Direction::Fetch, Some(session.callbacks()), None)
        .map_err(|e| session.classify(e))?;
    let default = connection
        .remote()
        .default_branch()
        .ok()
        .and_then(|buf| buf.as_str().map(String::from));
    Ok(default.and_then(|r| r.strip_prefix("refs/heads/").map(String::from)))
}

fn checkout_safe(repo: &Repository, target: &git2::Object<'_>) -> Result<(), GitError> {
    let mut builder = CheckoutBuilder::new();
    builder.safe();
    repo.checkout_tree(target, Some(&mut builder))
        .map_err(|e| match e.code() {
            git2::ErrorCode::Conflict | git2::ErrorCode::MergeConflict => GitError::Conflict {
                paths: vec![e.message().to_string()],
            },
            _ => GitError::from_git2(e, "checkout"),
        })
}

fn conflict_paths(index: &git2::Index) -> Result<Vec<String>, GitError> {
    let mut paths = Vec::new();
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
            paths.push(String::from_utf8_lossy(&entry.path).into_owned());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn signature(author: &Author) -> Result<git2::Signature<'static>, GitError> {
    let time = git2::Time::new(author.timestamp_seconds, 0);
    git2::Signature::new(&author.name, &author.email, &time).map_err(|e| {
        GitError::InvalidInput {
            message: format!("invalid author: {}", e.message()),
        }
    })
}

fn to_oid(id: git2::Oid) -> Result<Oid, GitError> {
    Ok(Oid::new(id.to_string())?)
}

fn commit_info(commit: &git2::Commit<'_>) -> Result<Commit, GitError> {
    let author = commit.author();
    Ok(Commit {
        oid: to_oid(commit.id())?,
        message: commit.message().unwrap_or("").to_string(),
        author: Author {
            name: author.name().unwrap_or("").to_string(),
            email: author.email().unwrap_or("").to_string(),
            timestamp_seconds: author.when().seconds(),
        },
    })
}

/// Path of `filepath` relative to the root `dir`; `""` for the root itself.
fn repo_relative(dir: &str, filepath: &str) -> Result<String, GitError> {
    let normalized = paths::normalize(filepath);
    let rel = if paths::is_absolute(&normalized) {
        paths::relative(dir, &normalized)
    } else if normalized == "." {
        String::new()
    } else {
        normalized
    };
    if paths::segments(&rel).first() == Some(&"..") {
        return Err(GitError::InvalidInput {
            message: format!("'{filepath}' is outside the repository"),
        });
    }
    Ok(rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SandboxStore;
    use tempfile::TempDir;

    fn client() -> (TempDir, Arc<dyn VirtualStore>, RepositoryClient) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn VirtualStore> =
            Arc::new(SandboxStore::new(dir.path().join("sandbox")).unwrap());
        let client = RepositoryClient::new(store.clone(), Arc::new(Config::default()));
        (dir, store, client)
    }

    mod relative_paths {
        use super::*;

        #[test]
        fn relative_and_absolute_inputs() {
            assert_eq!(repo_relative("/repo", "src/a.rs").unwrap(), "src/a.rs");
            assert_eq!(repo_relative("/repo", "/repo/src/a.rs").unwrap(), "src/a.rs");
            assert_eq!(repo_relative("/repo", ".").unwrap(), "");
            assert_eq!(repo_relative("/repo", "/repo").unwrap(), "");
        }

        #[test]
        fn outside_root_rejected() {
            assert!(repo_relative("/repo", "/other/a.rs").is_err());
            assert!(repo_relative("/repo", "../a.rs").is_err());
        }
    }

    mod lifecycle {
        use super::*;

        #[tokio::test]
        async fn init_with_seed_commit() {
            let (_dir, store, client) = client();
            client.init("/repo", true).await.unwrap();

            assert!(client.is_git_repo("/repo").await);
            assert!(store.exists("/repo/README.md").await.unwrap());

            let log = client.log("/repo", 5).await.unwrap();
            assert_eq!(log.len(), 1);
            assert_eq!(log[0].message, "Initial commit");
            assert_eq!(log[0].author.name, "gitbridge");
            assert_eq!(client.current_branch("/repo").await.unwrap(), "main");
            assert_eq!(client.list_branches("/repo").await.unwrap(), vec!["main"]);
        }

        #[tokio::test]
        async fn empty_repository_defaults() {
            let (_dir, _store, client) = client();
            client.init("/empty", false).await.unwrap();

            assert_eq!(client.current_branch("/empty").await.unwrap(), "main");
            assert!(client.log("/empty", 10).await.unwrap().is_empty());
            assert!(client.list_branches("/empty").await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn reinit_does_not_add_commits() {
            let (_dir, _store, client) = client();
            client.init("/repo", true).await.unwrap();
            client.init("/repo", true).await.unwrap();
            assert_eq!(client.log("/repo", 10).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn operations_outside_a_repo() {
            let (_dir, store, client) = client();
            store.mkdir("/plain", true).await.unwrap();
            assert!(!client.is_git_repo("/plain").await);
            let err = client.status("/plain").await.unwrap_err();
            assert!(matches!(err, GitError::NotARepo { .. }));
        }
    }

    mod working_tree {
        use super::*;

        #[tokio::test]
        async fn status_buckets() {
            let (_dir, store, client) = client();
            client.init("/repo", true).await.unwrap();

            store.write_file("/repo/README.md", b"changed\n").await.unwrap();
            store.write_file("/repo/new.txt", b"n").await.unwrap();
            store.write_file("/repo/staged.txt", b"s").await.unwrap();
            client.add("/repo", "staged.txt").await.unwrap();

            let status = client.status("/repo").await.unwrap();
            assert_eq!(status.modified, vec!["README.md"]);
            assert_eq!(status.staged, vec!["staged.txt"]);
            assert_eq!(status.untracked, vec!["new.txt"]);
        }

        #[tokio::test]
        async fn add_stages_deletions_and_rejects_unknown() {
            let (_dir, store, client) = client();
            client.init("/repo", true).await.unwrap();

            store.unlink("/repo/README.md").await.unwrap();
            client.add("/repo", "/repo/README.md").await.unwrap();
            let status = client.status("/repo").await.unwrap();
            assert_eq!(status.staged, vec!["README.md"]);
            assert!(status.modified.is_empty());

            let err = client.add("/repo", "ghost.txt").await.unwrap_err();
            assert!(matches!(err, GitError::NotFound { .. }));
        }

        #[tokio::test]
        async fn commit_with_explicit_author() {
            let (_dir, store, client) = client();
            client.init("/repo", true).await.unwrap();
            store.write_file("/repo/a.txt", b"a").await.unwrap();
            client.add("/repo", ".").await.unwrap();

            let author = Author {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                timestamp_seconds: 1_700_000_000,
            };
            let oid = client.commit("/repo", "Add a", Some(author.clone())).await.unwrap();

            let log = client.log("/repo", 1).await.unwrap();
            assert_eq!(log[0].oid, oid);
            assert_eq!(log[0].author, author);
            assert!(client.status("/repo").await.unwrap().is_clean());
        }

        #[tokio::test]
        async fn gitignore_merges_lines() {
            let (_dir, store, client) = client();
            client.init("/repo", false).await.unwrap();
            store.write_file("/repo/.gitignore", b"custom").await.unwrap();

            client
                .create_gitignore("/repo", &GitignoreTemplate::Custom("custom\nout/".into()))
                .await
                .unwrap();
            let content = store.read_file("/repo/.gitignore").await.unwrap();
            assert_eq!(String::from_utf8(content).unwrap(), "custom\nout/\n");
        }
    }

    mod branches {
        use super::*;

        #[tokio::test]
        async fn checkout_branch_and_revision() {
            let (_dir, store, client) = client();
            client.init("/repo", true).await.unwrap();
            let first = client.log("/repo", 1).await.unwrap()[0].oid.clone();

            client
                .with_repo("/repo", |repo| {
                    let head = repo.head()?.peel_to_commit()?;
                    repo.branch("feature", &head, false)?;
                    Ok(())
                })
                .await
                .unwrap();
            client.checkout("/repo", "feature").await.unwrap();
            assert_eq!(client.current_branch("/repo").await.unwrap(), "feature");

            store.write_file("/repo/f.txt", b"f").await.unwrap();
            client.add("/repo", "f.txt").await.unwrap();
            client.commit("/repo", "feature work", None).await.unwrap();

            client.checkout("/repo", "main").await.unwrap();
            assert!(!store.exists("/repo/f.txt").await.unwrap());

            client.checkout("/repo", first.as_str()).await.unwrap();
            // detached HEAD reports the fallback branch
            assert_eq!(client.current_branch("/repo").await.unwrap(), "main");

            let err = client.checkout("/repo", "nope").await.unwrap_err();
            assert!(matches!(err, GitError::NotFound { .. }));
        }

        #[tokio::test]
        async fn unborn_head_keeps_its_branch_name() {
            let (_dir, _store, client) = client();
            client.init("/repo", false).await.unwrap();
            client
                .with_repo("/repo", |repo| {
                    repo.set_head("refs/heads/trunk")?;
                    Ok(())
                })
                .await
                .unwrap();
            assert_eq!(client.current_branch("/repo").await.unwrap(), "trunk");
        }
    }

    #[tokio::test]
    async fn clone_rejects_nameless_url() {
        let (_dir, _store, client) = client();
        let err = client
            .clone(
                "https://example.com/",
                "/",
                &CloneOptions::default(),
                None,
                &TransportOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GitError::InvalidInput { .. }));
    }
}
