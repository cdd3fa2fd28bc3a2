//! secrets
//!
//! Persistence for git tokens.
//!
//! # Security
//!
//! - Values are never logged or included in error messages
//! - The file store uses 0600 permissions on Unix
//! - Writes are atomic (temp file + rename)
//!
//! Secrets are stored as plain TOML. Encrypting them at rest is left to the
//! embedding application; a [`SecretStore`] implementation is the place to
//! do that.
//!
//! # Example
//!
//! ```ignore
//! use gitbridge::secrets::{FileSecretStore, SecretStore};
//!
//! let store = FileSecretStore::new()?;
//! store.set("git.github.com.username", "octocat")?;
//! store.set("git.github.com.token", "ghp_xxxx")?;
//! ```

mod file_store;
mod traits;

pub use file_store::FileSecretStore;
pub use traits::{SecretError, SecretStore};
