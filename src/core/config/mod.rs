//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$GITBRIDGE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitbridge/config.toml`
//! 3. `~/.gitbridge/config.toml` (canonical write location)
//!
//! Missing files are not an error; defaults apply.
//!
//! # Example
//!
//! ```no_run
//! use gitbridge::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("remote: {}", config.remote());
//! println!("ignore: {:?}", config.mirror_ignore());
//! ```

pub mod schema;

pub use schema::{AuthorConfig, ConfigFile, MirrorConfig, RepositoryConfig, TransportConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Default entries excluded from host mirroring.
pub const DEFAULT_IGNORE: &[&str] = &["node_modules", ".next", "dist", "build", "target"];

/// Default per-directory copy concurrency.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default network deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw file contents
    pub file: ConfigFile,
    /// Where the file was loaded from, if anywhere
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated.
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        config.loaded_from = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        file.validate()?;
        Ok(Self {
            file,
            loaded_from: None,
        })
    }

    /// Candidate config paths in precedence order.
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("GITBRIDGE_CONFIG") {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("gitbridge/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gitbridge/config.toml"));
        }
        paths
    }

    /// Canonical write location: `~/.gitbridge/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gitbridge/config.toml"))
    }

    /// Write a config file atomically (temp file + rename).
    pub fn write_to(path: &Path, file: &ConfigFile) -> Result<(), ConfigError> {
        file.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write = |temp: &Path| -> std::io::Result<()> {
            let mut handle = fs::File::create(temp)?;
            handle.write_all(contents.as_bytes())?;
            handle.sync_all()
        };
        write(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// Default commit author name.
    pub fn author_name(&self) -> &str {
        self.file
            .author
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or("gitbridge")
    }

    /// Default commit author email.
    pub fn author_email(&self) -> &str {
        self.file
            .author
            .as_ref()
            .and_then(|a| a.email.as_deref())
            .unwrap_or("gitbridge@localhost")
    }

    /// Remote name for push/pull/fetch.
    pub fn remote(&self) -> &str {
        self.repository(|r| r.remote.as_deref()).unwrap_or("origin")
    }

    /// Branch used by `init` and when HEAD cannot be resolved.
    pub fn default_branch(&self) -> &str {
        self.repository(|r| r.default_branch.as_deref())
            .unwrap_or("main")
    }

    /// File created by `init` for the initial commit.
    pub fn seed_file(&self) -> &str {
        self.repository(|r| r.seed_file.as_deref())
            .unwrap_or("README.md")
    }

    /// Message of the initial commit.
    pub fn seed_message(&self) -> &str {
        self.repository(|r| r.seed_message.as_deref())
            .unwrap_or("Initial commit")
    }

    /// Names excluded from mirroring.
    pub fn mirror_ignore(&self) -> Vec<String> {
        match self.file.mirror.as_ref().and_then(|m| m.ignore.clone()) {
            Some(ignore) => ignore,
            None => DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Bounded concurrency for per-directory file copies.
    pub fn mirror_concurrency(&self) -> usize {
        self.file
            .mirror
            .as_ref()
            .and_then(|m| m.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    /// Network deadline; `None` when disabled with `timeout_secs = 0`.
    pub fn transport_timeout(&self) -> Option<Duration> {
        match self.file.transport.as_ref().and_then(|t| t.timeout_secs) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        }
    }

    /// Proxy URL for the transport.
    pub fn proxy(&self) -> Option<&str> {
        self.file
            .transport
            .as_ref()
            .and_then(|t| t.proxy.as_deref())
    }

    /// Custom user agent for the transport.
    pub fn user_agent(&self) -> Option<&str> {
        self.file
            .transport
            .as_ref()
            .and_then(|t| t.user_agent.as_deref())
    }

    /// Path of the loaded file, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    fn repository<'a>(
        &'a self,
        field: impl FnOnce(&'a RepositoryConfig) -> Option<&'a str>,
    ) -> Option<&'a str> {
        self.file.repository.as_ref().and_then(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.author_name(), "gitbridge");
        assert_eq!(config.remote(), "origin");
        assert_eq!(config.default_branch(), "main");
        assert_eq!(config.seed_file(), "README.md");
        assert_eq!(config.seed_message(), "Initial commit");
        assert!(config.mirror_ignore().contains(&"node_modules".to_string()));
        assert_eq!(config.mirror_concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(config.transport_timeout(), Some(DEFAULT_TIMEOUT));
        assert!(config.proxy().is_none());
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_toml_str(
            "[author]\nname = \"Ada\"\nemail = \"ada@example.com\"\n\
             [mirror]\nignore = []\n\
             [transport]\ntimeout_secs = 0\n",
        )
        .unwrap();
        assert_eq!(config.author_name(), "Ada");
        assert_eq!(config.author_email(), "ada@example.com");
        assert!(config.mirror_ignore().is_empty());
        assert_eq!(config.transport_timeout(), None);
    }

    #[test]
    fn parse_error_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not = [valid").unwrap();

        match Config::load_from(&path) {
            Err(ConfigError::ParseError { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let file = ConfigFile {
            repository: Some(RepositoryConfig {
                default_branch: Some("trunk".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        Config::write_to(&path, &file).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_branch(), "trunk");
        assert_eq!(loaded.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn write_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile {
            mirror: Some(MirrorConfig {
                concurrency: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(Config::write_to(&dir.path().join("c.toml"), &file).is_err());
    }
}
