//! cli
//!
//! Command-line interface for gitbridge.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Pick the store backend and host directory for this invocation
//! - Delegate to command handlers, which only talk to [`GitSync`]
//!
//! # Invocation model
//!
//! Each run is one session. With `--host`, the host directory is imported
//! into the store first and every mutating command mirrors back into it,
//! so the host directory is the durable copy and the sandbox can be
//! thrown away afterwards. Without `--host`, the sandbox itself persists
//! between runs.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::core::types::Credentials;
use crate::credentials::SecretStoreCredentialProvider;
use crate::error::{ErrorKind, SyncError};
use crate::host::{FsHostDirectory, HostDirectory};
use crate::secrets::FileSecretStore;
use crate::store::{PassThroughStore, SandboxStore, VirtualStore};
use crate::sync::GitSync;
use crate::ui::output::{self, Mode};

/// Environment variable overriding the secrets file location.
pub const SECRETS_ENV: &str = "GITBRIDGE_SECRETS";
/// Environment variable holding a token bound for this session only.
pub const TOKEN_ENV: &str = "GITBRIDGE_TOKEN";
/// Username paired with [`TOKEN_ENV`].
pub const USERNAME_ENV: &str = "GITBRIDGE_USERNAME";

/// Everything a command handler needs.
#[derive(Debug)]
pub struct Context {
    pub sync: GitSync,
    pub mode: Mode,
    /// Repository root in the store
    pub repo: String,
    pub host: Option<Arc<dyn HostDirectory>>,
    pub secrets: Arc<FileSecretStore>,
    pub provider: Arc<SecretStoreCredentialProvider>,
    /// Per-run sandbox deleted when the run ends
    ephemeral: Option<SandboxStore>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load().context("failed to load configuration")?;
        if let Some(path) = config.loaded_from() {
            tracing::debug!(path = %path.display(), "loaded configuration");
        }

        let (store, ephemeral): (Arc<dyn VirtualStore>, Option<SandboxStore>) = if cli.passthrough
        {
            (Arc::new(PassThroughStore::new()), None)
        } else if let Some(dir) = &cli.sandbox {
            let sandbox = SandboxStore::new(dir).context("failed to create sandbox")?;
            (Arc::new(sandbox), None)
        } else if cli.host.is_some() {
            let sandbox = SandboxStore::ephemeral().context("failed to create sandbox")?;
            (Arc::new(sandbox.clone()), Some(sandbox))
        } else {
            let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
            let sandbox = SandboxStore::new(base.join("gitbridge").join("sandbox"))
                .context("failed to create sandbox")?;
            (Arc::new(sandbox), None)
        };

        let repo = match (&cli.repo, cli.passthrough) {
            (Some(repo), _) => repo.clone(),
            (None, true) => std::env::current_dir()
                .context("cannot determine current directory")?
                .to_string_lossy()
                .replace('\\', "/"),
            (None, false) => "/repo".to_string(),
        };

        let host = cli
            .host
            .as_ref()
            .map(|dir| {
                FsHostDirectory::open_shared(dir)
                    .with_context(|| format!("cannot open host directory {}", dir.display()))
            })
            .transpose()?;

        let secrets = Arc::new(match std::env::var_os(SECRETS_ENV) {
            Some(path) => FileSecretStore::with_path(PathBuf::from(path)),
            None => FileSecretStore::new().context("failed to locate secrets file")?,
        });
        let provider = Arc::new(SecretStoreCredentialProvider::new(secrets.clone()));
        // a CLI run is an unlocked session
        provider.unlock();

        let sync = GitSync::new(store, config).with_provider(provider.clone());
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            let username =
                std::env::var(USERNAME_ENV).unwrap_or_else(|_| "x-access-token".to_string());
            sync.bind_credentials(Credentials::new(username, token));
        }

        Ok(Self {
            sync,
            mode: Mode::from_flags(cli.quiet, cli.json),
            repo,
            host,
            secrets,
            provider,
            ephemeral,
        })
    }

    /// Remove the per-run sandbox, if any.
    pub async fn finish(self) {
        if let Some(sandbox) = self.ephemeral {
            let root = sandbox.root().to_path_buf();
            if let Err(e) = sandbox.purge().await {
                tracing::warn!(root = %root.display(), "failed to remove sandbox: {e}");
            }
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.quiet, cli.debug);

    if let Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let ctx = Context::from_cli(&cli)?;
        let result = commands::dispatch(cli.command, &ctx).await;
        ctx.finish().await;
        result
    })
}

/// Print an error with a remedy hint for classified failures.
pub fn report_error(err: &anyhow::Error) {
    output::error(format!("{err:#}"));
    let Some(sync_err) = err.downcast_ref::<SyncError>() else {
        return;
    };
    if let Some(hint) = hint(sync_err.kind()) {
        eprintln!("hint: {hint}");
    }
}

fn hint(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::AuthenticationFailed => {
            Some("store credentials with `gitbridge auth` or set GITBRIDGE_TOKEN")
        }
        ErrorKind::NoRepositoryBound => Some("pass --repo or --host, or run `gitbridge init`"),
        ErrorKind::NetworkError => Some("check the connection, proxy and transport.timeout_secs"),
        ErrorKind::CorsBlocked => Some("the remote must allow cross-origin requests, or use a proxy"),
        ErrorKind::Conflict => Some("commit or discard local changes, then retry"),
        _ => None,
    }
}

fn init_tracing(quiet: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("gitbridge=debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("GITBRIDGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
