//! core
//!
//! Core domain types, configuration, and path utilities.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, GitStatus, Commit, Credentials
//! - [`paths`] - Separator-agnostic path manipulation
//! - [`naming`] - Repository names and hosts derived from remote URLs
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Path handling never depends on the host separator
//! - Schemas are strict and self-describing

pub mod config;
pub mod naming;
pub mod paths;
pub mod types;
