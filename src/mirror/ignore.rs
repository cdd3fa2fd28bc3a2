//! mirror::ignore
//!
//! Names excluded from mirroring.

use crate::core::config::Config;
use crate::core::paths;

/// Ordered set of literal entry names excluded from mirroring.
///
/// A name matches an entry with exactly that name at any depth of the walk,
/// so `node_modules` excludes both `/node_modules` and `/pkg/node_modules`.
/// Matching is case-sensitive and never uses globs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    names: Vec<String>,
}

impl IgnoreList {
    /// Build from names, dropping empties and duplicates (first wins).
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(Self::default(), |list, name| list.with(name))
    }

    /// Excludes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The configured `[mirror] ignore` list.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.mirror_ignore())
    }

    /// Append a name if it is not already present.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() && !self.names.contains(&name) {
            self.names.push(name);
        }
        self
    }

    /// Whether an entry with this name is excluded.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Whether any segment of a relative path is excluded.
    pub fn matches_path(&self, path: &str) -> bool {
        paths::segments(path).iter().any(|s| self.is_ignored(s))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_in_order() {
        let list = IgnoreList::new(["dist", "", "node_modules", "dist"]);
        assert_eq!(list.names(), ["dist", "node_modules"]);
    }

    #[test]
    fn literal_name_match() {
        let list = IgnoreList::new(["node_modules"]);
        assert!(list.is_ignored("node_modules"));
        assert!(!list.is_ignored("node_modules2"));
        assert!(!list.is_ignored("Node_Modules"));
    }

    #[test]
    fn path_match_at_any_depth() {
        let list = IgnoreList::new(["target"]);
        assert!(list.matches_path("target/debug/app"));
        assert!(list.matches_path("crates/a/target"));
        assert!(!list.matches_path("src/targets.rs"));
    }

    #[test]
    fn from_default_config() {
        let list = IgnoreList::from_config(&Config::default());
        assert!(list.is_ignored("node_modules"));
        assert!(!list.is_ignored(".git"));
        assert!(IgnoreList::empty().is_empty());
    }
}
