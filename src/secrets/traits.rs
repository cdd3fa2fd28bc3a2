//! secrets::traits
//!
//! Key-value interface for persisted secrets.
//!
//! Keys are dotted and namespaced by remote host, e.g. `git.github.com.token`.
//! Implementations never log values and never put them in error messages.

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors from secret storage. Messages never contain secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read or parse the store.
    #[error("failed to read secrets: {0}")]
    ReadError(String),

    /// Failed to write the store.
    #[error("failed to write secrets: {0}")]
    WriteError(String),

    /// The store refused access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid key (empty, or containing whitespace).
    #[error("invalid secret key '{0}'")]
    InvalidKey(String),
}

impl SecretError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SecretError::ReadError(_) | SecretError::WriteError(_) => ErrorKind::Io,
            SecretError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            SecretError::InvalidKey(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Persisted secret storage.
///
/// `get` returns `Ok(None)` for missing keys; `delete` is idempotent.
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    fn delete(&self, key: &str) -> Result<(), SecretError>;

    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

pub(crate) fn validate_key(key: &str) -> Result<(), SecretError> {
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(SecretError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        assert!(validate_key("git.github.com.token").is_ok());
        assert!(matches!(validate_key(""), Err(SecretError::InvalidKey(_))));
        assert!(validate_key("git.a b.token").is_err());
    }

    #[test]
    fn kinds() {
        assert_eq!(SecretError::ReadError("x".into()).kind(), ErrorKind::Io);
        assert_eq!(
            SecretError::PermissionDenied("x".into()).kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            SecretError::InvalidKey(" ".into()).kind(),
            ErrorKind::InvalidInput
        );
    }
}
