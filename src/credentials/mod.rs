//! credentials
//!
//! Where the engine gets `{username, token}` for a remote.
//!
//! # Architecture
//!
//! The engine only consumes [`CredentialProvider`]. Storage (and any
//! encryption at rest) belongs to the provider:
//!
//! - [`StaticCredentialProvider`]: fixed credentials, always unlocked
//! - [`SecretStoreCredentialProvider`]: per-host entries in a
//!   [`SecretStore`](crate::secrets::SecretStore), with an explicit lock
//!
//! Per-host keys are `git.<host>.username` and `git.<host>.token`. Remotes
//! without a host (local paths) use `git.default.*`, which also serves as
//! the fallback for hosts with no entry of their own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::core::naming;
use crate::core::types::Credentials;
use crate::error::ErrorKind;
use crate::secrets::{SecretError, SecretStore};

/// Key segment used for remotes without a host.
pub const DEFAULT_SCOPE: &str = "default";

/// Errors from credential providers.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// A username is stored for the scope but the token is missing.
    #[error("incomplete credentials for '{scope}': token missing")]
    Incomplete { scope: String },

    /// Provider-specific failure.
    #[error("credential provider failed: {message}")]
    Provider { message: String },
}

impl CredentialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CredentialError::Secret(e) => e.kind(),
            CredentialError::Incomplete { .. } => ErrorKind::AuthenticationFailed,
            CredentialError::Provider { .. } => ErrorKind::Unknown,
        }
    }
}

/// Supplies credentials for a remote, or `None` when it has none.
///
/// Callers check [`is_unlocked`](Self::is_unlocked) before asking; a locked
/// provider is treated as having no credentials.
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    fn is_unlocked(&self) -> bool;

    fn get_credentials(&self, remote_url: Option<&str>)
        -> Result<Option<Credentials>, CredentialError>;
}

/// Fixed credentials, returned for every remote they apply to.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn is_unlocked(&self) -> bool {
        true
    }

    fn get_credentials(
        &self,
        remote_url: Option<&str>,
    ) -> Result<Option<Credentials>, CredentialError> {
        let applies = remote_url.map_or(true, |url| self.credentials.applies_to(url));
        Ok(applies.then(|| self.credentials.clone()))
    }
}

/// Credentials persisted in a secret store, keyed by remote host.
///
/// Starts locked. While locked, [`get_credentials`](CredentialProvider::get_credentials)
/// returns `None` without touching the store.
#[derive(Debug)]
pub struct SecretStoreCredentialProvider {
    store: Arc<dyn SecretStore>,
    unlocked: AtomicBool,
}

impl SecretStoreCredentialProvider {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            unlocked: AtomicBool::new(false),
        }
    }

    pub fn unlock(&self) {
        self.unlocked.store(true, Ordering::SeqCst);
    }

    pub fn lock(&self) {
        self.unlocked.store(false, Ordering::SeqCst);
    }

    /// Persist credentials under the scope of `remote_url` (or the default
    /// scope). Works while locked.
    pub fn save(
        &self,
        remote_url: Option<&str>,
        credentials: &Credentials,
    ) -> Result<(), CredentialError> {
        let scope = scope_for(remote_url);
        self.store.set(&key(&scope, "username"), &credentials.username)?;
        self.store.set(&key(&scope, "token"), &credentials.token)?;
        tracing::debug!(scope = %scope, "stored credentials");
        Ok(())
    }

    /// Remove stored credentials for the scope of `remote_url`.
    pub fn forget(&self, remote_url: Option<&str>) -> Result<(), CredentialError> {
        let scope = scope_for(remote_url);
        self.store.delete(&key(&scope, "username"))?;
        self.store.delete(&key(&scope, "token"))?;
        Ok(())
    }

    fn lookup(&self, scope: &str) -> Result<Option<Credentials>, CredentialError> {
        let token = self.store.get(&key(scope, "token"))?;
        let username = self.store.get(&key(scope, "username"))?;
        match (username, token) {
            (Some(username), Some(token)) => Ok(Some(Credentials::new(username, token))),
            // token-only entries authenticate with the conventional user
            (None, Some(token)) => Ok(Some(Credentials::new("x-access-token", token))),
            (Some(_), None) => Err(CredentialError::Incomplete {
                scope: scope.to_string(),
            }),
            (None, None) => Ok(None),
        }
    }
}

impl CredentialProvider for SecretStoreCredentialProvider {
    fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    fn get_credentials(
        &self,
        remote_url: Option<&str>,
    ) -> Result<Option<Credentials>, CredentialError> {
        if !self.is_unlocked() {
            return Ok(None);
        }
        let scope = scope_for(remote_url);
        let found = match self.lookup(&scope)? {
            Some(found) => Some(found),
            None if scope != DEFAULT_SCOPE => self.lookup(DEFAULT_SCOPE)?,
            None => None,
        };
        Ok(found.map(|creds| match remote_url {
            Some(url) => creds.scoped_to(url),
            None => creds,
        }))
    }
}

fn scope_for(remote_url: Option<&str>) -> String {
    remote_url
        .and_then(naming::remote_host)
        .unwrap_or_else(|| DEFAULT_SCOPE.to_string())
}

fn key(scope: &str, field: &str) -> String {
    format!("git.{scope}.{field}")
}
