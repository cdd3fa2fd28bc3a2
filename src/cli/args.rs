//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `--host <DIR>`: host directory mirrored to and from the sandbox
//! - `--sandbox <DIR>` / `--passthrough`: store backend
//! - `--repo <PATH>`: repository root in the store
//! - `--debug`, `--json`, `--quiet`

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// gitbridge - Git over a sandboxed store, mirrored to a host directory
#[derive(Parser, Debug)]
#[command(name = "gitbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Host directory to import before and mirror after the command
    /// (for `clone`, the parent the repository is created in)
    #[arg(long, global = true, value_name = "DIR")]
    pub host: Option<PathBuf>,

    /// Persistent sandbox root (default: a fresh sandbox with --host, the
    /// shared data-dir sandbox without)
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "passthrough")]
    pub sandbox: Option<PathBuf>,

    /// Operate directly on real paths instead of a sandbox
    #[arg(long, global = true)]
    pub passthrough: bool,

    /// Repository root in the store (default: /repo, or the current
    /// directory with --passthrough)
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import the --host directory into the store and report what was copied
    #[command(
        name = "open",
        after_help = "\
EXAMPLES:
    # Import a project, skipping node_modules and other ignored directories
    gitbridge --host ~/code/app --sandbox ~/.cache/app open"
    )]
    Open,

    /// Clone a repository
    #[command(
        name = "clone",
        after_help = "\
EXAMPLES:
    # Clone into /app in the sandbox and mirror to ~/code/app
    gitbridge --host ~/code clone https://github.com/me/app.git

    # Shallow, single-branch clone of a release branch
    gitbridge clone https://github.com/me/app.git --depth 1 --single-branch --branch release"
    )]
    Clone {
        /// Remote URL
        url: String,

        /// Store directory the repository directory is created in
        #[arg(long, default_value = "/")]
        into: String,

        /// Shallow clone depth
        #[arg(long)]
        depth: Option<u32>,

        /// Fetch only one branch
        #[arg(long)]
        single_branch: bool,

        /// Branch to check out
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Show modified, staged and untracked files
    Status,

    /// Stage files (`.` for everything)
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Record staged changes
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Author name (default from config)
        #[arg(long, requires = "author_email")]
        author_name: Option<String>,

        /// Author email (default from config)
        #[arg(long, requires = "author_name")]
        author_email: Option<String>,
    },

    /// Push the current branch to the remote
    Push,

    /// Fetch and integrate the remote branch
    Pull,

    /// Fetch from the remote
    Fetch,

    /// Show recent commits
    Log {
        /// Number of commits
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// List local branches
    Branches,

    /// Switch to a branch, remote branch, or commit
    Checkout {
        /// Branch name or revision
        reference: String,
    },

    /// Create a repository
    Init {
        /// Skip the seed file and initial commit
        #[arg(long)]
        no_commit: bool,
    },

    /// Write or extend .gitignore from a template
    Gitignore {
        /// node, python, rust or default
        #[arg(conflicts_with = "text")]
        template: Option<String>,

        /// Literal content instead of a named template
        #[arg(long)]
        text: Option<String>,
    },

    /// List working tree files, optionally filtered by extension
    Files {
        /// Extensions such as `md` or `.rs`
        extensions: Vec<String>,
    },

    /// Store, check, or remove credentials for a remote host
    #[command(
        name = "auth",
        after_help = "\
EXAMPLES:
    # Store a token for github.com (prompts for the token)
    gitbridge auth --remote https://github.com --username me

    # Check whether credentials exist
    gitbridge auth --remote https://github.com --status

    # Remove them
    gitbridge auth --remote https://github.com --logout"
    )]
    Auth {
        /// Remote URL or host the credentials apply to (default scope when
        /// omitted)
        #[arg(long)]
        remote: Option<String>,

        /// Username for HTTP basic authentication
        #[arg(long)]
        username: Option<String>,

        /// Token (prompted when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Show whether credentials are stored
        #[arg(long, conflicts_with_all = ["logout", "token", "username"])]
        status: bool,

        /// Remove stored credentials
        #[arg(long, conflicts_with_all = ["token", "username"])]
        logout: bool,
    },

    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Command {
    /// Whether the command runs against a current repository.
    pub fn needs_repository(&self) -> bool {
        !matches!(
            self,
            Command::Clone { .. } | Command::Auth { .. } | Command::Completion { .. }
        )
    }
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gitbridge", "status", "--repo", "/proj", "--json"]).unwrap();
        assert_eq!(cli.repo.as_deref(), Some("/proj"));
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn sandbox_conflicts_with_passthrough() {
        let err = Cli::try_parse_from(["gitbridge", "--passthrough", "--sandbox", "/s", "status"]);
        assert!(err.is_err());
    }

    #[test]
    fn clone_options() {
        let cli = Cli::try_parse_from([
            "gitbridge",
            "clone",
            "https://example.com/a.git",
            "--depth",
            "1",
            "--single-branch",
            "-b",
            "dev",
        ])
        .unwrap();
        match cli.command {
            Command::Clone {
                depth,
                single_branch,
                branch,
                into,
                ..
            } => {
                assert_eq!(depth, Some(1));
                assert!(single_branch);
                assert_eq!(branch.as_deref(), Some("dev"));
                assert_eq!(into, "/");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn repository_requirements() {
        assert!(Command::Status.needs_repository());
        assert!(!Command::Completion { shell: Shell::Bash }.needs_repository());
    }
}
