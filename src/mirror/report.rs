//! mirror::report
//!
//! Outcome of a mirror pass.

use serde::Serialize;

use crate::error::ErrorKind;

/// An entry that could not be mirrored. The pass continued without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Path relative to the pass root, `/`-separated
    pub path: String,
    pub kind: ErrorKind,
    pub reason: String,
}

/// Counts and skipped entries of one or more mirror passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
    /// Files written to the destination
    pub files_copied: usize,
    /// Directories created (or found existing) at the destination
    pub directories: usize,
    /// Entries excluded by the ignore list
    pub ignored: usize,
    /// Host entries removed because the store no longer has them
    pub removed: usize,
    /// Entries that failed and were skipped
    pub skipped: Vec<SkippedEntry>,
}

impl MirrorReport {
    /// True when nothing was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Fold another pass into this one.
    pub fn merge(&mut self, other: MirrorReport) {
        self.files_copied += other.files_copied;
        self.directories += other.directories;
        self.ignored += other.ignored;
        self.removed += other.removed;
        self.skipped.extend(other.skipped);
    }

    pub(crate) fn skip(&mut self, path: &str, kind: ErrorKind, reason: impl ToString) {
        let reason = reason.to_string();
        tracing::warn!(path, %kind, "mirror skipped entry: {reason}");
        self.skipped.push(SkippedEntry {
            path: path.to_string(),
            kind,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates() {
        let mut a = MirrorReport {
            files_copied: 2,
            directories: 1,
            ..Default::default()
        };
        let mut b = MirrorReport::default();
        b.skip("x/y", ErrorKind::PermissionDenied, "denied");
        b.files_copied = 3;

        assert!(a.is_complete());
        a.merge(b);
        assert_eq!(a.files_copied, 5);
        assert_eq!(a.directories, 1);
        assert!(!a.is_complete());
        assert_eq!(a.skipped[0].path, "x/y");
    }
}
