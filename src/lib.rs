//! gitbridge - Git over a sandboxed store, mirrored to a host directory
//!
//! gitbridge runs Git operations against a repository whose bytes live in a
//! [`VirtualStore`](store::VirtualStore) (a private sandbox, or the real
//! filesystem) and keeps a user-visible host directory in step with it.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to [`sync`])
//! - [`sync`] - The [`GitSync`] facade: current repository, credentials, mirroring order
//! - [`git`] - Single interface for all Git engine operations and transport errors
//! - [`mirror`] - Recursive copy between the store and host directory handles
//! - [`store`] - Virtual store trait with sandboxed and pass-through backends
//! - [`host`] - Host directory handle capabilities
//! - [`credentials`] - Credential providers consumed by the facade
//! - [`secrets`] - Secret storage for the default credential provider
//! - [`core`] - Paths, naming rules, domain types, configuration
//! - [`ui`] - CLI output formatting
//!
//! # Invariants
//!
//! 1. The store is the Git-visible source of truth; host mirroring never
//!    rolls a store write back
//! 2. `.git` is imported before the working tree
//! 3. Operations needing a repository fail with `NoRepositoryBound` before
//!    touching any store
//! 4. Mutating operations on one facade never interleave

pub mod cli;
pub mod core;
pub mod credentials;
pub mod error;
pub mod git;
pub mod host;
pub mod mirror;
pub mod secrets;
pub mod store;
pub mod sync;
pub mod ui;

pub use error::{ErrorKind, SyncError};
pub use sync::{GitSync, MirrorStatus, RepoHandle};
