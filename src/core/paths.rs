//! core::paths
//!
//! Separator-agnostic path manipulation for virtual store paths.
//!
//! # Architecture
//!
//! Every path that crosses a component boundary (virtual store, host
//! mirror, git status output) is routed through these helpers so that
//! comparisons never depend on the host OS separator:
//!
//! - Both `/` and `\` are accepted as separators on input
//! - Repeated separators and `.` segments collapse
//! - Output is always `/`-separated
//!
//! None of these functions fail. Malformed input degrades to the closest
//! sensible path (empty segments are ignored).
//!
//! # Example
//!
//! ```
//! use gitbridge::core::paths;
//!
//! assert_eq!(paths::join(&["/repo", "src\\lib.rs"]), "/repo/src/lib.rs");
//! assert_eq!(paths::dirname("/repo/src/lib.rs"), "/repo/src");
//! assert_eq!(paths::basename("/repo/src/lib.rs"), "lib.rs");
//! assert_eq!(paths::extname("/repo/src/lib.rs"), ".rs");
//! assert_eq!(paths::relative("/repo", "/repo/src/lib.rs"), "src/lib.rs");
//! ```

/// Returns true for either separator convention.
fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Whether the path is rooted (starts with a separator).
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(is_separator)
}

/// Split a path into its meaningful segments.
///
/// Empty segments and `.` are dropped. `..` is preserved; use
/// [`normalize`] to resolve it.
///
/// # Example
///
/// ```
/// use gitbridge::core::paths::segments;
///
/// assert_eq!(segments("//a\\b/./c/"), vec!["a", "b", "c"]);
/// ```
pub fn segments(path: &str) -> Vec<&str> {
    path.split(is_separator)
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Normalize a path: unify separators, collapse repeats, resolve `.`/`..`.
///
/// `..` above the root of an absolute path is dropped. For relative paths
/// leading `..` segments are kept. An empty relative result is `"."`.
///
/// # Example
///
/// ```
/// use gitbridge::core::paths::normalize;
///
/// assert_eq!(normalize("/a//b/../c"), "/a/c");
/// assert_eq!(normalize("\\..\\x"), "/x");
/// assert_eq!(normalize("../x/./y"), "../x/y");
/// assert_eq!(normalize(""), ".");
/// ```
pub fn normalize(path: &str) -> String {
    let absolute = is_absolute(path);
    let mut out: Vec<&str> = Vec::new();

    for segment in segments(path) {
        if segment == ".." {
            match out.last() {
                Some(last) if *last != ".." => {
                    out.pop();
                }
                _ if absolute => {}
                _ => out.push(segment),
            }
        } else {
            out.push(segment);
        }
    }

    let joined = out.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join path segments and normalize the result.
///
/// A segment is appended even if it is itself absolute; empty segments are
/// ignored. The result is absolute when the first non-empty segment is.
///
/// # Example
///
/// ```
/// use gitbridge::core::paths::join;
///
/// assert_eq!(join(&["/repo", "", "a//b"]), "/repo/a/b");
/// assert_eq!(join(&["a", "/b"]), "a/b");
/// assert_eq!(join::<&str>(&[]), ".");
/// ```
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut buf = String::new();
    for part in parts.iter().map(AsRef::as_ref).filter(|p| !p.is_empty()) {
        if !buf.is_empty() {
            buf.push('/');
        }
        buf.push_str(part);
    }
    normalize(&buf)
}

/// The parent directory of a path.
///
/// Returns `"/"` for top-level absolute paths and `"."` for single-segment
/// relative paths.
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// The final segment of a path, or `""` for the root.
pub fn basename(path: &str) -> String {
    segments(path)
        .last()
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// The extension of the final segment, including the dot.
///
/// Dotfiles such as `.gitignore` have no extension.
///
/// # Example
///
/// ```
/// use gitbridge::core::paths::extname;
///
/// assert_eq!(extname("notes/readme.MD"), ".MD");
/// assert_eq!(extname("archive.tar.gz"), ".gz");
/// assert_eq!(extname(".gitignore"), "");
/// assert_eq!(extname("Makefile"), "");
/// ```
pub fn extname(path: &str) -> String {
    let base = basename(path);
    match base.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => base[idx..].to_string(),
    }
}

/// The path of `to` relative to `from`.
///
/// Both inputs are normalized first. Returns `""` when they are equal.
///
/// # Example
///
/// ```
/// use gitbridge::core::paths::relative;
///
/// assert_eq!(relative("/a/b", "/a/c/d"), "../c/d");
/// assert_eq!(relative("/a", "/a"), "");
/// ```
pub fn relative(from: &str, to: &str) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_segments = segments(&from);
    let to_segments = segments(&to);

    let common = from_segments
        .iter()
        .zip(to_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = Vec::new();
    out.extend(std::iter::repeat("..").take(from_segments.len() - common));
    out.extend(&to_segments[common..]);
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod normalize {
        use super::*;

        #[test]
        fn collapses_repeated_separators() {
            assert_eq!(normalize("/a///b//c"), "/a/b/c");
        }

        #[test]
        fn backslashes_become_slashes() {
            assert_eq!(normalize("C:\\work\\repo"), "C:/work/repo");
        }

        #[test]
        fn root_stays_root() {
            assert_eq!(normalize("/"), "/");
            assert_eq!(normalize("\\\\"), "/");
        }

        #[test]
        fn parent_above_root_is_dropped() {
            assert_eq!(normalize("/../../a"), "/a");
        }

        #[test]
        fn trailing_separator_removed() {
            assert_eq!(normalize("a/b/"), "a/b");
        }
    }

    mod join {
        use super::*;

        #[test]
        fn mixed_separators() {
            assert_eq!(join(&["/repo\\", "\\src", "main.rs"]), "/repo/src/main.rs");
        }

        #[test]
        fn relative_result() {
            assert_eq!(join(&["a", "b"]), "a/b");
        }

        #[test]
        fn resolves_parent_segments() {
            assert_eq!(join(&["/repo/src", "..", "README.md"]), "/repo/README.md");
        }

        #[test]
        fn accepts_owned_strings() {
            let parts = vec!["/x".to_string(), "y".to_string()];
            assert_eq!(join(&parts), "/x/y");
        }
    }

    mod dirname_basename {
        use super::*;

        #[test]
        fn dirname_cases() {
            assert_eq!(dirname("/a/b/c.txt"), "/a/b");
            assert_eq!(dirname("/a"), "/");
            assert_eq!(dirname("/"), "/");
            assert_eq!(dirname("file.txt"), ".");
            assert_eq!(dirname("a\\b"), "a");
        }

        #[test]
        fn basename_cases() {
            assert_eq!(basename("/a/b/c.txt"), "c.txt");
            assert_eq!(basename("a\\b\\"), "b");
            assert_eq!(basename("/"), "");
        }
    }

    mod relative {
        use super::*;

        #[test]
        fn descendant() {
            assert_eq!(relative("/repo", "/repo/a/b.txt"), "a/b.txt");
        }

        #[test]
        fn sibling() {
            assert_eq!(relative("/repo/a", "/repo/b"), "../b");
        }

        #[test]
        fn ancestor() {
            assert_eq!(relative("/repo/a/b", "/repo"), "../..");
        }

        #[test]
        fn separator_agnostic() {
            assert_eq!(relative("\\repo", "/repo\\x"), "x");
        }
    }

    #[test]
    fn extname_edge_cases() {
        assert_eq!(extname("file."), ".");
        assert_eq!(extname("/dir.d/file"), "");
        assert_eq!(extname(""), "");
    }
}
