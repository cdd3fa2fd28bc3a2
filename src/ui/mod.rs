//! ui
//!
//! Terminal output for the CLI.
//!
//! All command output goes through [`output`] so `--quiet` and `--json`
//! behave the same everywhere.

pub mod output;
