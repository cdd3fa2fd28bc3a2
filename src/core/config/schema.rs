//! core::config::schema
//!
//! Configuration schema types.
//!
//! Every field is optional; accessors on [`super::Config`] apply defaults.
//! Unknown keys are rejected so typos surface as parse errors.
//!
//! # Example
//!
//! ```toml
//! [author]
//! name = "Build Bot"
//! email = "bot@example.com"
//!
//! [repository]
//! remote = "origin"
//! default_branch = "main"
//!
//! [mirror]
//! ignore = ["node_modules", "dist"]
//! concurrency = 4
//!
//! [transport]
//! timeout_secs = 60
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Default commit identity
    pub author: Option<AuthorConfig>,

    /// Repository conventions
    pub repository: Option<RepositoryConfig>,

    /// Host mirroring settings
    pub mirror: Option<MirrorConfig>,

    /// Network transport settings
    pub transport: Option<TransportConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(author) = &self.author {
            author.validate()?;
        }
        if let Some(repository) = &self.repository {
            repository.validate()?;
        }
        if let Some(mirror) = &self.mirror {
            mirror.validate()?;
        }
        Ok(())
    }
}

/// `[author]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AuthorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "author.name cannot be empty".into(),
                ));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ConfigError::InvalidValue(format!(
                    "author.email '{}' must contain '@'",
                    email
                )));
            }
        }
        Ok(())
    }
}

/// `[repository]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Remote name used by push/pull/fetch (default: "origin")
    pub remote: Option<String>,

    /// Branch for `init` and the unborn-HEAD fallback (default: "main")
    pub default_branch: Option<String>,

    /// File written by `init` when an initial commit is requested
    pub seed_file: Option<String>,

    /// Message of the initial commit
    pub seed_message: Option<String>,
}

impl RepositoryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            if remote.is_empty() || remote.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid remote name '{}'",
                    remote
                )));
            }
        }
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch.as_str())
                .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        }
        if let Some(seed) = &self.seed_file {
            if seed.is_empty() || seed.starts_with(".git/") || seed == ".git" {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid seed file '{}'",
                    seed
                )));
            }
        }
        Ok(())
    }
}

/// `[mirror]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Entry names never copied between the store and the host
    pub ignore: Option<Vec<String>>,

    /// Max concurrent file copies per directory
    pub concurrency: Option<usize>,
}

impl MirrorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == Some(0) {
            return Err(ConfigError::InvalidValue(
                "mirror.concurrency must be at least 1".into(),
            ));
        }
        if let Some(ignore) = &self.ignore {
            if let Some(bad) = ignore
                .iter()
                .find(|name| name.is_empty() || name.contains(['/', '\\']))
            {
                return Err(ConfigError::InvalidValue(format!(
                    "mirror.ignore entries must be single names, got '{}'",
                    bad
                )));
            }
        }
        Ok(())
    }
}

/// `[transport]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Deadline for network operations; 0 disables it
    pub timeout_secs: Option<u64>,

    /// Proxy URL handed to the transport
    pub proxy: Option<String>,

    /// Custom user agent
    pub user_agent: Option<String>,
}
