//! Repository lifecycle commands: open, clone, init, gitignore

use anyhow::{bail, Result};
use serde_json::json;

use crate::cli::Context;
use crate::core::types::{CloneOptions, GitignoreTemplate};
use crate::mirror::MirrorReport;
use crate::ui::output;

pub fn open(ctx: &Context, imported: Option<MirrorReport>) -> Result<()> {
    let Some(report) = imported else {
        bail!("open needs --host <DIR>");
    };
    output::emit(&json!({ "repo": ctx.repo, "import": report }), ctx.mode)?;
    output::print(
        format!("Imported into {}: {}", ctx.repo, output::format_report(&report)),
        ctx.mode,
    );
    Ok(())
}

pub async fn clone(
    ctx: &Context,
    url: &str,
    into: &str,
    depth: Option<u32>,
    single_branch: bool,
    branch: Option<String>,
) -> Result<()> {
    let options = CloneOptions {
        depth,
        single_branch,
        reference: branch,
    };
    let root = ctx.sync.clone(url, into, &options, ctx.host.clone()).await?;
    let mirror = ctx.sync.last_mirror_status();
    output::mirror_warnings(&mirror, ctx.mode);

    output::emit(&json!({ "root": root, "mirror": mirror }), ctx.mode)?;
    output::print(format!("Cloned into {root}"), ctx.mode);
    if ctx.host.is_none() {
        output::print(
            format!("Use --repo {root} to run commands against it."),
            ctx.mode,
        );
    }
    Ok(())
}

pub async fn init(ctx: &Context, with_initial_commit: bool) -> Result<()> {
    ctx.sync.init(&ctx.repo, with_initial_commit).await?;
    let mirror = ctx.sync.last_mirror_status();
    output::mirror_warnings(&mirror, ctx.mode);

    let branch = ctx.sync.get_current_branch().await?;
    output::emit(
        &json!({ "root": ctx.repo, "branch": branch, "mirror": mirror }),
        ctx.mode,
    )?;
    output::print(
        format!("Initialized repository at {} on {branch}", ctx.repo),
        ctx.mode,
    );
    Ok(())
}

pub async fn gitignore(ctx: &Context, template: Option<&str>, text: Option<String>) -> Result<()> {
    let template = match (template, text) {
        (_, Some(text)) => GitignoreTemplate::Custom(text),
        (Some(name), None) => name.parse()?,
        (None, None) => GitignoreTemplate::Default,
    };
    let mirror = ctx.sync.create_gitignore(&template).await?;
    output::mirror_warnings(&mirror, ctx.mode);
    output::emit(&json!({ "mirror": mirror }), ctx.mode)?;
    output::print("Updated .gitignore", ctx.mode);
    Ok(())
}
