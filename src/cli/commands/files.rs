//! files command - List working tree files by extension

use anyhow::Result;

use crate::cli::Context;
use crate::ui::output;

pub async fn files(ctx: &Context, extensions: &[String]) -> Result<()> {
    let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
    let files = ctx.sync.get_repo_files(&extensions).await?;
    output::emit(&files, ctx.mode)?;
    if !files.is_empty() {
        output::print(output::format_list(&files, ""), ctx.mode);
    }
    Ok(())
}
