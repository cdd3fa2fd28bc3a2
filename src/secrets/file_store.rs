//! secrets::file_store
//!
//! TOML file secret store at `~/.gitbridge/secrets.toml`.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{validate_key, SecretError, SecretStore};

/// Secrets in a flat TOML table, one key per line.
///
/// Every mutation rewrites the whole file through a temp file that is
/// restricted to the owner before any content is written.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Store at `~/.gitbridge/secrets.toml`.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self {
            path: home.join(".gitbridge").join("secrets.toml"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored keys, sorted. Values are not returned.
    pub fn keys(&self) -> Result<Vec<String>, SecretError> {
        Ok(self.load()?.into_keys().collect())
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SecretError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(SecretError::PermissionDenied(self.path.display().to_string()))
            }
            Err(e) => return Err(SecretError::ReadError(format!("{}: {e}", self.path.display()))),
        };

        // toml's message quotes the offending line; keep only the position.
        toml::from_str(&content).map_err(|e| {
            let at = e
                .span()
                .map(|span| format!(" at byte {}", span.start))
                .unwrap_or_default();
            SecretError::ReadError(format!("cannot parse {}{at}", self.path.display()))
        })
    }

    fn save(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {e}")))?;
        }

        let content = toml::to_string(secrets)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize secrets: {e}")))?;
        let temp_path = self.path.with_extension("toml.tmp");

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {e}")))?;

            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {e}")))?;

            file.write_all(content.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| SecretError::WriteError(format!("cannot write secrets: {e}")))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot replace secrets file: {e}")))
    }

    /// True when the file is absent or owner-only.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.permissions().mode() & 0o777 == 0o600),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(SecretError::ReadError(e.to_string())),
        }
    }

    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        Ok(true)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        validate_key(key)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        validate_key(key)?;
        let mut secrets = self.load()?;
        secrets.insert(key.to_string(), value.to_string());
        self.save(&secrets)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        validate_key(key)?;
        let mut secrets = self.load()?;
        if secrets.remove(key).is_some() {
            self.save(&secrets)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileSecretStore) {
        let temp = TempDir::new().unwrap();
        let store = FileSecretStore::with_path(temp.path().join("nested/secrets.toml"));
        (temp, store)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_temp, store) = store();
        assert_eq!(store.get("git.example.com.token").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
        store.delete("git.example.com.token").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn set_get_overwrite_delete() {
        let (_temp, store) = store();
        store.set("git.example.com.token", "one").unwrap();
        store.set("git.example.com.token", "two").unwrap();
        store.set("git.example.com.username", "me").unwrap();

        assert_eq!(
            store.get("git.example.com.token").unwrap().as_deref(),
            Some("two")
        );
        assert_eq!(
            store.keys().unwrap(),
            vec!["git.example.com.token", "git.example.com.username"]
        );

        store.delete("git.example.com.token").unwrap();
        assert!(!store.exists("git.example.com.token").unwrap());
    }

    #[test]
    fn persists_across_instances() {
        let (_temp, store) = store();
        store.set("k", "v \"quoted\"\nnext").unwrap();
        let again = FileSecretStore::with_path(store.path());
        assert_eq!(again.get("k").unwrap().as_deref(), Some("v \"quoted\"\nnext"));
    }

    #[test]
    fn parse_error_hides_content() {
        let (_temp, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "k = \"ghp_secret").unwrap();

        let err = store.get("k").unwrap_err();
        assert!(matches!(err, SecretError::ReadError(_)));
        assert!(!err.to_string().contains("ghp_secret"));
    }

    #[test]
    fn rejects_bad_keys() {
        let (_temp, store) = store();
        assert!(matches!(
            store.set("", "v"),
            Err(SecretError::InvalidKey(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn owner_only_permissions() {
        let (_temp, store) = store();
        assert!(store.verify_permissions().unwrap());
        store.set("k", "v").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(store.verify_permissions().unwrap());
    }
}
