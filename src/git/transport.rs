//! git::transport
//!
//! Remote transport plumbing: credentials, cancellation, deadlines, and
//! error reclassification.
//!
//! # Authentication
//!
//! The credential callback is attached only when credentials are bound;
//! otherwise the operation runs anonymously. Bound credentials are offered
//! at most once per operation. A second request means the remote rejected
//! them, and the operation fails with `AuthenticationFailed` instead of
//! looping.
//!
//! # Cancellation
//!
//! Progress, sideband and push negotiation callbacks check the
//! [`CancelToken`] and the deadline. Push is aborted in negotiation, before
//! any remote ref is updated. The check granularity is the engine's
//! callback frequency; a stalled connection is bounded only by the
//! engine's own timeouts.
//!
//! # Reclassification
//!
//! Raw transport messages are not actionable, so failures are mapped onto
//! [`GitError`] classes by [`classify_message`] and the engine's error code
//! and class.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::GitError;
use crate::core::config::Config;
use crate::core::types::Credentials;
use crate::error::ErrorKind;

/// Shared flag that aborts in-flight network operations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every operation holding a clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-operation transport settings.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Deadline for the whole operation; `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
    /// Proxy URL; `None` uses the engine's auto-detection
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

impl TransportOptions {
    /// Settings from the `[transport]` config section.
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.transport_timeout(),
            cancel: CancelToken::new(),
            proxy: config.proxy().map(String::from),
            user_agent: config.user_agent().map(String::from),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Classify a raw transport message. `None` when nothing matches.
///
/// Checked in order: authentication (`401`), permission (`403`), missing
/// repository (`404`), CORS, then connectivity.
///
/// ```
/// use gitbridge::error::ErrorKind;
/// use gitbridge::git::transport::classify_message;
///
/// assert_eq!(
///     classify_message("unexpected http status code: 401"),
///     Some(ErrorKind::AuthenticationFailed)
/// );
/// assert_eq!(classify_message("weird"), None);
/// ```
pub fn classify_message(message: &str) -> Option<ErrorKind> {
    let lower = message.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["401", "unauthorized", "authentication", "credentials"]) {
        Some(ErrorKind::AuthenticationFailed)
    } else if has(&["403", "forbidden"]) {
        Some(ErrorKind::PermissionDenied)
    } else if has(&["404", "not found", "could not find repository", "does not exist"]) {
        Some(ErrorKind::NotFound)
    } else if has(&["cors", "cross-origin"]) {
        Some(ErrorKind::CorsBlocked)
    } else if has(&[
        "failed to connect",
        "could not connect",
        "connection refused",
        "connection reset",
        "could not resolve",
        "failed to resolve",
        "timed out",
        "network",
        "ssl",
        "tls",
    ]) {
        Some(ErrorKind::NetworkError)
    } else {
        None
    }
}

/// Build the [`GitError`] for a classified message.
fn error_for(kind: ErrorKind, message: String) -> GitError {
    match kind {
        ErrorKind::AuthenticationFailed => GitError::AuthenticationFailed { message },
        ErrorKind::PermissionDenied => GitError::PermissionDenied { message },
        ErrorKind::NotFound => GitError::NotFound { what: message },
        ErrorKind::CorsBlocked => GitError::CorsBlocked { message },
        ErrorKind::NetworkError => GitError::Network { message },
        ErrorKind::Cancelled => GitError::Cancelled,
        _ => GitError::Internal { message },
    }
}

/// Why the callbacks aborted the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    Cancelled,
    TimedOut,
}

/// State shared by the callbacks of a single network operation.
pub(crate) struct TransportSession<'a> {
    options: &'a TransportOptions,
    credentials: Option<&'a Credentials>,
    started: Instant,
    auth_requests: Cell<u32>,
    aborted: Cell<Option<Abort>>,
    rejected: RefCell<Vec<String>>,
}

impl<'a> TransportSession<'a> {
    pub(crate) fn new(options: &'a TransportOptions, credentials: Option<&'a Credentials>) -> Self {
        Self {
            options,
            credentials,
            started: Instant::now(),
            auth_requests: Cell::new(0),
            aborted: Cell::new(None),
            rejected: RefCell::new(Vec::new()),
        }
    }

    /// True while the operation may continue. Records the abort reason.
    fn proceed(&self) -> bool {
        if self.aborted.get().is_some() {
            return false;
        }
        let abort = if self.options.cancel.is_cancelled() {
            Some(Abort::Cancelled)
        } else if self
            .options
            .timeout
            .is_some_and(|limit| self.started.elapsed() >= limit)
        {
            Some(Abort::TimedOut)
        } else {
            None
        };
        self.aborted.set(abort);
        abort.is_none()
    }

    /// Fail fast if cancelled before any network activity.
    pub(crate) fn ensure_active(&self) -> Result<(), GitError> {
        if self.proceed() {
            Ok(())
        } else {
            Err(self.abort_error().unwrap_or(GitError::Cancelled))
        }
    }

    fn abort_error(&self) -> Option<GitError> {
        self.aborted.get().map(|abort| match abort {
            Abort::Cancelled => GitError::Cancelled,
            Abort::TimedOut => GitError::TimedOut {
                seconds: self.options.timeout.map(|t| t.as_secs()).unwrap_or(0),
            },
        })
    }

    pub(crate) fn callbacks(&self) -> git2::RemoteCallbacks<'_> {
        let mut callbacks = git2::RemoteCallbacks::new();

        if let Some(creds) = self.credentials {
            callbacks.credentials(move |_url, _username_from_url, allowed| {
                let requests = self.auth_requests.get() + 1;
                self.auth_requests.set(requests);
                if !self.proceed() {
                    return Err(git2::Error::from_str("operation aborted"));
                }
                if requests > 1 {
                    return Err(git2::Error::new(
                        git2::ErrorCode::Auth,
                        git2::ErrorClass::Http,
                        "credentials were rejected by the remote",
                    ));
                }
                if allowed.is_user_pass_plaintext() {
                    git2::Cred::userpass_plaintext(&creds.username, &creds.token)
                } else {
                    Err(git2::Error::new(
                        git2::ErrorCode::Auth,
                        git2::ErrorClass::Http,
                        "remote requested an unsupported credential type",
                    ))
                }
            });
        }

        callbacks.transfer_progress(move |_progress| self.proceed());
        callbacks.sideband_progress(move |_data| self.proceed());
        callbacks.push_negotiation(move |_updates| {
            if self.proceed() {
                Ok(())
            } else {
                Err(git2::Error::from_str("push aborted before updating refs"))
            }
        });
        callbacks.push_update_reference(move |refname, status| {
            if let Some(message) = status {
                self.rejected
                    .borrow_mut()
                    .push(format!("{refname}: {message}"));
            }
            Ok(())
        });
        callbacks
    }

    fn proxy_options(&self) -> git2::ProxyOptions<'_> {
        let mut proxy = git2::ProxyOptions::new();
        match &self.options.proxy {
            Some(url) => {
                proxy.url(url);
            }
            None => {
                proxy.auto();
            }
        }
        proxy
    }

    /// Custom HTTP headers sent with every request.
    pub(crate) fn custom_headers(&self) -> Vec<String> {
        self.options
            .user_agent
            .iter()
            .map(|agent| format!("User-Agent: {agent}"))
            .collect()
    }

    pub(crate) fn fetch_options(&self) -> git2::FetchOptions<'_> {
        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(self.callbacks());
        options.proxy_options(self.proxy_options());
        let headers = self.custom_headers();
        if !headers.is_empty() {
            let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
            options.custom_headers(&refs);
        }
        options
    }

    pub(crate) fn push_options(&self) -> git2::PushOptions<'_> {
        let mut options = git2::PushOptions::new();
        options.remote_callbacks(self.callbacks());
        options.proxy_options(self.proxy_options());
        let headers = self.custom_headers();
        if !headers.is_empty() {
            let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
            options.custom_headers(&refs);
        }
        options
    }

    /// Start a new connection phase; credentials may be requested once more.
    pub(crate) fn reset_auth(&self) {
        self.auth_requests.set(0);
    }

    /// Per-ref rejections reported by the remote during push.
    pub(crate) fn take_rejections(&self) -> Vec<String> {
        self.rejected.take()
    }

    /// Reclassify a transport failure.
    pub(crate) fn classify(&self, err: git2::Error) -> GitError {
        if let Some(abort) = self.abort_error() {
            return abort;
        }
        if self.auth_requests.get() > 1 {
            return GitError::AuthenticationFailed {
                message: "credentials were rejected by the remote".to_string(),
            };
        }
        classify_transport_error(&err)
    }
}

/// Reclassify a raw engine transport error.
pub fn classify_transport_error(err: &git2::Error) -> GitError {
    let message = err.message().to_string();
    match err.code() {
        git2::ErrorCode::Auth => return GitError::AuthenticationFailed { message },
        git2::ErrorCode::Certificate => return GitError::Network { message },
        git2::ErrorCode::NotFastForward => return GitError::PermissionDenied { message },
        git2::ErrorCode::User => return GitError::Cancelled,
        _ => {}
    }
    if let Some(kind) = classify_message(&message) {
        return error_for(kind, message);
    }
    match err.class() {
        git2::ErrorClass::Net | git2::ErrorClass::Ssl | git2::ErrorClass::Http => {
            GitError::Network { message }
        }
        _ if err.code() == git2::ErrorCode::NotFound => GitError::NotFound { what: message },
        _ => GitError::Internal { message },
    }
}
