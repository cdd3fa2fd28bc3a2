//! cli::commands::auth
//!
//! Store, check, or remove credentials for a remote host.
//!
//! The command:
//! - stores credentials through the secret store, scoped by remote host
//! - NEVER prints tokens to stdout/stderr
//! - prompts for the token with masked input when `--token` is omitted
//!
//! # Example
//!
//! ```bash
//! # Prompt for a token for github.com
//! gitbridge auth --remote https://github.com --username octocat
//!
//! # Non-interactive
//! gitbridge auth --remote github.com --username octocat --token ghp_xxxx
//!
//! # Check status / remove
//! gitbridge auth --remote github.com --status
//! gitbridge auth --remote github.com --logout
//! ```

use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Context as _, Result};
use serde_json::json;

use crate::cli::Context;
use crate::core::naming;
use crate::core::types::Credentials;
use crate::credentials::{CredentialProvider, DEFAULT_SCOPE};
use crate::ui::output::{self, Mode};

/// Run the auth command.
///
/// `remote` may be a URL or a bare host; without it the default scope
/// (used for host-less remotes and as a fallback) is targeted.
pub fn auth(
    ctx: &Context,
    remote: Option<&str>,
    username: Option<&str>,
    token: Option<&str>,
    status: bool,
    logout: bool,
) -> Result<()> {
    let remote_url = remote.map(remote_url);
    let scope = remote_url
        .as_deref()
        .and_then(naming::remote_host)
        .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

    if status {
        return show_status(ctx, remote_url.as_deref(), &scope);
    }

    if logout {
        ctx.provider
            .forget(remote_url.as_deref())
            .context("Failed to remove stored credentials")?;
        output::emit(&json!({ "scope": scope, "authenticated": false }), ctx.mode)?;
        output::print(format!("Removed credentials for {scope}."), ctx.mode);
        return Ok(());
    }

    let token = match token {
        Some(token) => token.to_string(),
        None => prompt_token(ctx.mode, &scope)?,
    };
    validate_token(&token)?;

    let credentials = Credentials::new(username.unwrap_or("x-access-token"), token);
    ctx.provider
        .save(remote_url.as_deref(), &credentials)
        .context("Failed to store credentials")?;

    output::emit(&json!({ "scope": scope, "authenticated": true }), ctx.mode)?;
    output::print(format!("Credentials stored for {scope}."), ctx.mode);
    Ok(())
}

/// Report whether credentials resolve for the scope. Never prints them.
fn show_status(ctx: &Context, remote_url: Option<&str>, scope: &str) -> Result<()> {
    let found = ctx
        .provider
        .get_credentials(remote_url)
        .context("Failed to read stored credentials")?;

    output::emit(
        &json!({
            "scope": scope,
            "authenticated": found.is_some(),
            "username": found.as_ref().map(|c| c.username.as_str()),
            "secrets_file": ctx.secrets.path(),
        }),
        ctx.mode,
    )?;
    if let Ok(false) = ctx.secrets.verify_permissions() {
        output::warn(
            format!("{} is readable by other users", ctx.secrets.path().display()),
            ctx.mode,
        );
    }
    match found {
        Some(credentials) => output::print(
            format!("Authenticated for {scope} as {}.", credentials.username),
            ctx.mode,
        ),
        None => {
            output::print(format!("No credentials for {scope}."), ctx.mode);
            output::print("Run 'gitbridge auth --remote <URL>' to add them.", ctx.mode);
        }
    }
    Ok(())
}

/// Accept `github.com` as shorthand for `https://github.com`.
fn remote_url(remote: &str) -> String {
    if remote.contains("://") || remote.contains('@') || remote.starts_with('/') {
        remote.to_string()
    } else {
        format!("https://{remote}")
    }
}

fn prompt_token(mode: Mode, scope: &str) -> Result<String> {
    if mode != Mode::Normal || !io::stdin().is_terminal() {
        bail!("Token required. Use --token <TOKEN> or run interactively.");
    }

    print!("Token for {scope}: ");
    io::stdout().flush()?;
    let token = rpassword::read_password().context("Failed to read token")?;
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    Ok(token)
}

/// Basic format checks; the token is not verified against the remote.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }
    if token.chars().any(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_hosts() {
        assert_eq!(remote_url("github.com"), "https://github.com");
        assert_eq!(remote_url("https://gitlab.com/a"), "https://gitlab.com/a");
        assert_eq!(remote_url("git@github.com:a/b"), "git@github.com:a/b");
    }

    #[test]
    fn token_validation() {
        assert!(validate_token("").is_err());
        assert!(validate_token("abc def").is_err());
        assert!(validate_token("ghp\n").is_err());
        assert!(validate_token("ghp_abcdef123456").is_ok());
    }
}
