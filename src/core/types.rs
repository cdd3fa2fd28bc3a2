//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`GitStatus`] - Bucketed working tree snapshot
//! - [`Commit`] / [`Author`] - Immutable commit records
//! - [`Credentials`] - Username + token pair, optionally scoped to a remote
//! - [`CloneOptions`] - Depth, single-branch and ref selection for clones
//! - [`GitignoreTemplate`] - Seed content for `.gitignore`
//!
//! # Validation
//!
//! `BranchName` and `Oid` enforce validity at construction time. Invalid
//! values cannot be represented.
//!
//! ```
//! use gitbridge::core::types::{BranchName, Oid};
//!
//! assert!(BranchName::new("feature/login").is_ok());
//! assert!(BranchName::new("bad..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("unknown gitignore template: {0}")]
    UnknownTemplate(String),
}

/// A validated Git branch name.
///
/// Follows the `git check-ref-format --branch` rules that matter in
/// practice: non-empty, not `@`, no leading `.`/`-`, no trailing `/` or
/// `.lock`, and none of `..`, `@{`, `//`, whitespace, control characters,
/// or `~^:\?*[`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name).map_err(|reason| {
            TypeError::InvalidBranchName(format!("'{}' {}", name, reason))
        })?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), &'static str> {
        if name.is_empty() {
            return Err("is empty");
        }
        if name == "@" {
            return Err("is reserved");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return Err("cannot start with '.' or '-'");
        }
        if name.ends_with('/') || name.ends_with(".lock") {
            return Err("cannot end with '/' or '.lock'");
        }
        if name.contains("..") || name.contains("@{") || name.contains("//") {
            return Err("cannot contain '..', '@{' or '//'");
        }
        if name
            .chars()
            .any(|c| c.is_ascii_control() || c.is_whitespace() || "~^:\\?*[".contains(c))
        {
            return Err("contains a forbidden character");
        }
        if name
            .split('/')
            .any(|component| component.starts_with('.') || component.ends_with(".lock"))
        {
            return Err("has a component starting with '.' or ending with '.lock'");
        }
        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full ref name (`refs/heads/<name>`).
    pub fn refname(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier (hex SHA-1 or SHA-256), stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a validated object id.
    ///
    /// # Example
    ///
    /// ```
    /// use gitbridge::core::types::Oid;
    ///
    /// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
    /// assert_eq!(oid.short(7), "abc123d");
    /// ```
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into();
        let valid_len = oid.len() == 40 || oid.len() == 64;
        if !valid_len || !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(oid));
        }
        Ok(Self(oid.to_ascii_lowercase()))
    }

    /// Abbreviated form, clamped to the full length.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the OID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the working tree, bucketed by state.
///
/// Paths are relative to the repository root, `/`-separated and sorted.
/// Recomputed on every call; never cached. A path may appear in both
/// `staged` and `modified` when it was edited again after staging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    /// Tracked files with unstaged changes (including deletions)
    pub modified: Vec<String>,
    /// Files with changes recorded in the index
    pub staged: Vec<String>,
    /// Files not known to the index
    pub untracked: Vec<String>,
}

impl GitStatus {
    /// True when nothing is modified, staged, or untracked.
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.staged.is_empty() && self.untracked.is_empty()
    }
}

/// Commit author (or committer) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch
    pub timestamp_seconds: i64,
}

impl Author {
    /// An author stamped with the current time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp_seconds: chrono::Utc::now().timestamp(),
        }
    }
}

/// A commit as returned by `log`. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub oid: Oid,
    pub message: String,
    pub author: Author,
}

impl Commit {
    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Username + token used for HTTP basic authentication.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
    /// Restricts these credentials to remotes on the same host.
    pub remote_url: Option<String>,
}

impl Credentials {
    /// Unscoped credentials.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            remote_url: None,
        }
    }

    /// Scope these credentials to the host of `url`.
    pub fn scoped_to(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Whether these credentials may be sent to `url`.
    ///
    /// Unscoped credentials apply everywhere. Scoped credentials apply when
    /// the hosts match, or the URLs are identical for host-less remotes.
    ///
    /// ```
    /// use gitbridge::core::types::Credentials;
    ///
    /// let creds = Credentials::new("me", "t").scoped_to("https://github.com/a/b.git");
    /// assert!(creds.applies_to("https://github.com/c/d.git"));
    /// assert!(!creds.applies_to("https://gitlab.com/a/b.git"));
    /// ```
    pub fn applies_to(&self, url: &str) -> bool {
        let Some(scope) = &self.remote_url else {
            return true;
        };
        match (
            super::naming::remote_host(scope),
            super::naming::remote_host(url),
        ) {
            (Some(a), Some(b)) => a == b,
            (None, None) => scope == url,
            _ => false,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("remote_url", &self.remote_url)
            .finish()
    }
}

/// Options for `clone`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Shallow clone depth; `None` fetches full history
    pub depth: Option<u32>,
    /// Fetch only the selected (or default) branch
    pub single_branch: bool,
    /// Branch to check out instead of the remote default
    pub reference: Option<String>,
}

/// Built-in `.gitignore` seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitignoreTemplate {
    Default,
    Node,
    Python,
    Rust,
    Custom(String),
}

impl GitignoreTemplate {
    /// Rendered file content, newline terminated.
    pub fn content(&self) -> String {
        let lines: &[&str] = match self {
            GitignoreTemplate::Default => &[".DS_Store", "Thumbs.db", "*.log", ".env"],
            GitignoreTemplate::Node => &[
                "node_modules/",
                "dist/",
                "build/",
                ".next/",
                "npm-debug.log*",
                ".env",
            ],
            GitignoreTemplate::Python => &[
                "__pycache__/",
                "*.py[cod]",
                ".venv/",
                "venv/",
                "*.egg-info/",
                ".env",
            ],
            GitignoreTemplate::Rust => &["target/", "**/*.rs.bk", "*.pdb"],
            GitignoreTemplate::Custom(text) => {
                let mut text = text.clone();
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                return text;
            }
        };
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl FromStr for GitignoreTemplate {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "" => Ok(GitignoreTemplate::Default),
            "node" | "javascript" | "typescript" => Ok(GitignoreTemplate::Node),
            "python" => Ok(GitignoreTemplate::Python),
            "rust" => Ok(GitignoreTemplate::Rust),
            _ => Err(TypeError::UnknownTemplate(s.to_string())),
        }
    }
}
