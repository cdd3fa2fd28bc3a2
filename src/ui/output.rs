//! ui::output
//!
//! Output formatting and display.
//!
//! Human output goes to stdout and respects `--quiet`. With `--json`, each
//! command prints exactly one JSON document instead. Warnings go to stderr.

use std::fmt::Display;

use serde::Serialize;

use crate::mirror::MirrorReport;
use crate::sync::MirrorStatus;

/// Output mode selected by global flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Quiet,
    Normal,
    Json,
}

impl Mode {
    /// `--json` wins over `--quiet`.
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        if json {
            Mode::Json
        } else if quiet {
            Mode::Quiet
        } else {
            Mode::Normal
        }
    }

    pub fn is_json(self) -> bool {
        self == Mode::Json
    }
}

/// Print a human-readable line (normal mode only).
pub fn print(message: impl Display, mode: Mode) {
    if mode == Mode::Normal {
        println!("{message}");
    }
}

/// Print a JSON document (json mode only).
pub fn emit<T: Serialize>(value: &T, mode: Mode) -> serde_json::Result<()> {
    if mode.is_json() {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Print a warning unless quiet. JSON mode still warns on stderr.
pub fn warn(message: impl Display, mode: Mode) {
    if mode != Mode::Quiet {
        eprintln!("warning: {message}");
    }
}

pub fn error(message: impl Display) {
    eprintln!("error: {message}");
}

/// Format a list of items, one per line.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{prefix}{item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of a mirror pass.
pub fn format_report(report: &MirrorReport) -> String {
    let mut line = format!(
        "{} files, {} directories",
        report.files_copied, report.directories
    );
    if report.ignored > 0 {
        line.push_str(&format!(", {} ignored", report.ignored));
    }
    if report.removed > 0 {
        line.push_str(&format!(", {} removed", report.removed));
    }
    if !report.skipped.is_empty() {
        line.push_str(&format!(", {} skipped", report.skipped.len()));
    }
    line
}

/// Warn about skipped entries or a failed mirror.
pub fn mirror_warnings(status: &MirrorStatus, mode: Mode) {
    match status {
        MirrorStatus::Mirrored(report) => {
            for skipped in &report.skipped {
                warn(
                    format!("not mirrored: {} ({})", skipped.path, skipped.reason),
                    mode,
                );
            }
        }
        MirrorStatus::Failed { message, .. } => {
            warn(format!("host directory not updated: {message}"), mode)
        }
        MirrorStatus::NotBound => {}
    }
}
