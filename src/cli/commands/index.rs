//! Working tree commands: status, add, commit

use anyhow::Result;
use serde_json::json;

use crate::cli::Context;
use crate::core::types::{Author, GitStatus};
use crate::ui::output;

pub async fn status(ctx: &Context) -> Result<()> {
    let status = ctx.sync.status().await?;
    let branch = ctx.sync.get_current_branch().await?;
    output::emit(&json!({ "branch": branch, "status": status }), ctx.mode)?;
    output::print(render(&branch, &status), ctx.mode);
    Ok(())
}

fn render(branch: &str, status: &GitStatus) -> String {
    let mut out = format!("On branch {branch}");
    if status.is_clean() {
        out.push_str("\nnothing to commit, working tree clean");
        return out;
    }
    for (title, paths) in [
        ("Changes to be committed:", &status.staged),
        ("Changes not staged for commit:", &status.modified),
        ("Untracked files:", &status.untracked),
    ] {
        if !paths.is_empty() {
            out.push_str(&format!("\n\n{title}\n{}", output::format_list(paths, "  ")));
        }
    }
    out
}

pub async fn add(ctx: &Context, paths: &[String]) -> Result<()> {
    for path in paths {
        ctx.sync.add(path).await?;
    }
    output::mirror_warnings(&ctx.sync.last_mirror_status(), ctx.mode);
    output::emit(&json!({ "added": paths }), ctx.mode)?;
    Ok(())
}

pub async fn commit(
    ctx: &Context,
    message: &str,
    author: Option<(String, String)>,
) -> Result<()> {
    let author = author.map(|(name, email)| Author::now(name, email));
    let oid = ctx.sync.commit(message, author).await?;
    output::mirror_warnings(&ctx.sync.last_mirror_status(), ctx.mode);

    let branch = ctx.sync.get_current_branch().await?;
    output::emit(&json!({ "branch": branch, "commit": oid }), ctx.mode)?;
    output::print(
        format!("[{branch} {}] {}", oid.short(7), message.lines().next().unwrap_or("")),
        ctx.mode,
    );
    Ok(())
}
