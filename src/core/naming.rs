//! core::naming
//!
//! Naming rules derived from remote URLs.
//!
//! # Features
//!
//! - Derive the repository directory name from a clone URL
//! - Extract the host used to scope credentials

use url::Url;

/// Derive a repository directory name from a remote URL.
///
/// Uses the last non-empty path segment with any trailing `.git` removed.
/// Works for HTTPS URLs, scp-style SSH URLs, and local paths. Returns
/// `None` when no usable segment exists.
///
/// # Example
///
/// ```
/// use gitbridge::core::naming::repo_name_from_url;
///
/// assert_eq!(
///     repo_name_from_url("https://github.com/owner/project.git"),
///     Some("project".to_string())
/// );
/// assert_eq!(
///     repo_name_from_url("git@github.com:owner/project"),
///     Some("project".to_string())
/// );
/// assert_eq!(repo_name_from_url("https://github.com/"), None);
/// ```
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) if parsed.has_host() || parsed.scheme() == "file" => parsed.path().to_string(),
        // scp-style `user@host:path` parses as an opaque URL, fall through
        _ => match url.split_once(':') {
            Some((prefix, rest)) if prefix.contains('@') => rest.to_string(),
            _ => url.to_string(),
        },
    };

    let last = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .last()?;
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Extract the lowercase host of a remote URL.
///
/// scp-style URLs (`git@host:path`) are supported. Local paths have no host.
///
/// # Example
///
/// ```
/// use gitbridge::core::naming::remote_host;
///
/// assert_eq!(remote_host("https://GitHub.com/a/b.git"), Some("github.com".to_string()));
/// assert_eq!(remote_host("git@gitlab.com:a/b.git"), Some("gitlab.com".to_string()));
/// assert_eq!(remote_host("/srv/git/b.git"), None);
/// ```
pub fn remote_host(url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            return Some(host.to_ascii_lowercase());
        }
    }

    let (prefix, _) = url.split_once(':')?;
    let (_, host) = prefix.split_once('@')?;
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_https() {
        assert_eq!(
            repo_name_from_url("https://example.com/team/app.git"),
            Some("app".to_string())
        );
        assert_eq!(
            repo_name_from_url("https://example.com/team/app/"),
            Some("app".to_string())
        );
    }

    #[test]
    fn repo_name_local_paths() {
        assert_eq!(
            repo_name_from_url("/tmp/remotes/origin.git"),
            Some("origin".to_string())
        );
        assert_eq!(
            repo_name_from_url("file:///tmp/remotes/origin.git"),
            Some("origin".to_string())
        );
        assert_eq!(
            repo_name_from_url("C:\\remotes\\origin.git"),
            Some("origin".to_string())
        );
    }

    #[test]
    fn repo_name_rejects_bare_suffix() {
        assert_eq!(repo_name_from_url("https://example.com/.git"), None);
        assert_eq!(repo_name_from_url(""), None);
    }

    #[test]
    fn host_extraction() {
        assert_eq!(
            remote_host("https://user@example.com:8443/x.git"),
            Some("example.com".to_string())
        );
        assert_eq!(remote_host("ssh://git@example.com/x.git"), Some("example.com".to_string()));
        assert_eq!(remote_host("relative/path"), None);
    }
}
