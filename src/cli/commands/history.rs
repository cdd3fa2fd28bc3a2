//! Branch and history commands: log, branches, checkout

use anyhow::Result;
use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::cli::Context;
use crate::core::types::Commit;
use crate::ui::output;

pub async fn log(ctx: &Context, count: usize) -> Result<()> {
    let commits = ctx.sync.log(count).await?;
    output::emit(&commits, ctx.mode)?;
    if commits.is_empty() {
        output::print("No commits yet.", ctx.mode);
    }
    for commit in &commits {
        output::print(format_commit(commit), ctx.mode);
    }
    Ok(())
}

fn format_commit(commit: &Commit) -> String {
    let date = Utc
        .timestamp_opt(commit.author.timestamp_seconds, 0)
        .single()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "{} {} {} <{}> {}",
        commit.oid.short(7),
        date,
        commit.author.name,
        commit.author.email,
        commit.summary()
    )
}

pub async fn branches(ctx: &Context) -> Result<()> {
    let branches = ctx.sync.list_branches().await?;
    let current = ctx.sync.get_current_branch().await?;
    output::emit(&json!({ "current": current, "branches": branches }), ctx.mode)?;
    for branch in &branches {
        let marker = if *branch == current { "*" } else { " " };
        output::print(format!("{marker} {branch}"), ctx.mode);
    }
    Ok(())
}

pub async fn checkout(ctx: &Context, reference: &str) -> Result<()> {
    ctx.sync.checkout(reference).await?;
    output::mirror_warnings(&ctx.sync.last_mirror_status(), ctx.mode);
    let branch = ctx.sync.get_current_branch().await?;
    output::emit(&json!({ "checked_out": reference, "branch": branch }), ctx.mode)?;
    output::print(format!("Switched to {reference}"), ctx.mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Author, Oid};

    #[test]
    fn commit_line() {
        let commit = Commit {
            oid: Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap(),
            message: "Add parser\n\nDetails".into(),
            author: Author {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                timestamp_seconds: 0,
            },
        };
        assert_eq!(
            format_commit(&commit),
            "0123456 1970-01-01 00:00 Ada <ada@example.com> Add parser"
        );
    }
}
