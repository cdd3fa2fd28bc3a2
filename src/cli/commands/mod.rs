//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls [`GitSync`](crate::sync::GitSync) on the context
//! 3. Formats and displays output (human or `--json`)
//!
//! Before any handler that needs a repository runs, [`bind`] makes one
//! current: by importing `--host`, or by pointing at `--repo` in the store.

mod auth;
mod completion;
mod files;
mod history;
mod index;
mod remote;
mod repo;

pub use auth::auth;
pub use completion::completion;

use anyhow::Result;

use super::args::Command;
use super::Context;
use crate::mirror::MirrorReport;

/// Dispatch a command to its handler.
pub async fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    let imported = if command.needs_repository() {
        bind(ctx).await?
    } else {
        None
    };

    match command {
        Command::Open => repo::open(ctx, imported),
        Command::Clone {
            url,
            into,
            depth,
            single_branch,
            branch,
        } => repo::clone(ctx, &url, &into, depth, single_branch, branch).await,
        Command::Init { no_commit } => repo::init(ctx, !no_commit).await,
        Command::Gitignore { template, text } => {
            repo::gitignore(ctx, template.as_deref(), text).await
        }

        Command::Status => index::status(ctx).await,
        Command::Add { paths } => index::add(ctx, &paths).await,
        Command::Commit {
            message,
            author_name,
            author_email,
        } => index::commit(ctx, &message, author_name.zip(author_email)).await,

        Command::Push => remote::push(ctx).await,
        Command::Pull => remote::pull(ctx).await,
        Command::Fetch => remote::fetch(ctx).await,

        Command::Log { count } => history::log(ctx, count).await,
        Command::Branches => history::branches(ctx).await,
        Command::Checkout { reference } => history::checkout(ctx, &reference).await,

        Command::Files { extensions } => files::files(ctx, &extensions).await,

        Command::Auth {
            remote,
            username,
            token,
            status,
            logout,
        } => auth::auth(
            ctx,
            remote.as_deref(),
            username.as_deref(),
            token.as_deref(),
            status,
            logout,
        ),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Make `ctx.repo` the current repository. Returns the import report when
/// a host directory was imported.
async fn bind(ctx: &Context) -> Result<Option<MirrorReport>> {
    match &ctx.host {
        Some(host) => {
            let report = ctx.sync.open_from_host_handle(host.clone(), &ctx.repo).await?;
            for skipped in &report.skipped {
                crate::ui::output::warn(
                    format!("not imported: {} ({})", skipped.path, skipped.reason),
                    ctx.mode,
                );
            }
            Ok(Some(report))
        }
        None => {
            ctx.sync.set_repo_dir(&ctx.repo, None).await;
            Ok(None)
        }
    }
}
