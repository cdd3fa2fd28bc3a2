//! Network commands: push, pull, fetch

use anyhow::Result;
use serde_json::json;

use crate::cli::Context;
use crate::git::PullOutcome;
use crate::ui::output;

pub async fn push(ctx: &Context) -> Result<()> {
    ctx.sync.push().await?;
    let branch = ctx.sync.get_current_branch().await?;
    output::mirror_warnings(&ctx.sync.last_mirror_status(), ctx.mode);
    output::emit(&json!({ "pushed": branch }), ctx.mode)?;
    output::print(format!("Pushed {branch}"), ctx.mode);
    Ok(())
}

pub async fn pull(ctx: &Context) -> Result<()> {
    let outcome = ctx.sync.pull().await?;
    output::mirror_warnings(&ctx.sync.last_mirror_status(), ctx.mode);
    output::emit(&outcome, ctx.mode)?;
    let message = match &outcome {
        PullOutcome::UpToDate => "Already up to date.".to_string(),
        PullOutcome::FastForward { commit } => format!("Fast-forwarded to {}", commit.short(7)),
        PullOutcome::Adopted { commit } => format!("Checked out {}", commit.short(7)),
        PullOutcome::Merged { commit } => format!("Merged as {}", commit.short(7)),
    };
    output::print(message, ctx.mode);
    Ok(())
}

pub async fn fetch(ctx: &Context) -> Result<()> {
    ctx.sync.fetch().await?;
    output::mirror_warnings(&ctx.sync.last_mirror_status(), ctx.mode);
    output::emit(&json!({ "fetched": true }), ctx.mode)?;
    Ok(())
}
