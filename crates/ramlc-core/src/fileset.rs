//! # File Sets
//!
//! A `FileSet` is the immutable input of every compile and validate call:
//! a mapping from `/`-separated relative path to raw text, as produced by
//! the archive reader.
//!
//! Keys are normalized on insertion and on lookup (`.` segments dropped,
//! `..` segments collapsed, leading `./` and `/` removed), so no two keys are
//! path-equivalent.

use std::collections::BTreeMap;

/// Directory names whose contents are documentation rather than API structure.
pub const DOCUMENTATION_DIRS: &[&str] = &["doc", "docs", "documentation"];

/// Immutable mapping of normalized relative path to file text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<String, String>,
}

impl FileSet {
    /// Create an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file, normalizing its path. Returns `self` for chaining.
    pub fn with_file(mut self, path: impl AsRef<str>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Insert a file, normalizing its path.
    pub fn insert(&mut self, path: impl AsRef<str>, text: impl Into<String>) {
        self.files.insert(normalize_path(path.as_ref()), text.into());
    }

    /// Look up a file by exact (normalized) path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize_path(path)).map(String::as_str)
    }

    /// Returns true if the normalized path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    /// All paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of files in the set.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the set holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Find a file whose path ends with `target` on a segment boundary.
    ///
    /// Leading `./` and `../` segments of `target` are dropped before
    /// matching. The lexicographically first match wins.
    pub fn find_by_suffix(&self, target: &str) -> Option<(&str, &str)> {
        let stripped = strip_relative_prefix(target);
        if stripped.is_empty() {
            return None;
        }
        let suffix = format!("/{stripped}");
        self.files
            .iter()
            .find(|(path, _)| path.as_str() == stripped || path.ends_with(&suffix))
            .map(|(path, text)| (path.as_str(), text.as_str()))
    }

    /// Resolve `target` relative to `origin` and look it up, falling back to
    /// a suffix search. Returns the resolved key and the file text.
    pub fn resolve(&self, origin: &str, target: &str) -> Option<(String, &str)> {
        let joined = join_relative(origin, target);
        if let Some((path, text)) = self.files.get_key_value(&joined) {
            return Some((path.clone(), text.as_str()));
        }
        self.find_by_suffix(target)
            .map(|(path, text)| (path.to_string(), text))
    }
}

impl<P: AsRef<str>, T: Into<String>> FromIterator<(P, T)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for (path, text) in iter {
            set.insert(path, text);
        }
        set
    }
}

/// Normalize a relative path: unify separators, drop `.` and empty segments,
/// and collapse `..` against the preceding segment.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Directory part of a normalized file path (empty for root-level files).
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|idx| &path[..idx]).unwrap_or("")
}

/// Resolve `target` against the directory of `base_file`.
///
/// A target starting with `/` is taken relative to the file set root.
pub fn join_relative(base_file: &str, target: &str) -> String {
    if target.starts_with('/') {
        return normalize_path(target);
    }
    let dir = parent_dir(base_file);
    if dir.is_empty() {
        normalize_path(target)
    } else {
        normalize_path(&format!("{dir}/{target}"))
    }
}

/// Returns true if any directory segment of `path` is a documentation directory.
pub fn is_documentation_path(path: &str) -> bool {
    let normalized = normalize_path(path);
    let mut segments: Vec<&str> = normalized.split('/').collect();
    segments.pop();
    segments
        .iter()
        .any(|seg| DOCUMENTATION_DIRS.contains(&seg.to_ascii_lowercase().as_str()))
}

fn strip_relative_prefix(target: &str) -> String {
    let mut rest = target.trim();
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("../") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        } else {
            break;
        }
    }
    normalize_path(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dot_segments() {
        assert_eq!(normalize_path("./a/b/../c.raml"), "a/c.raml");
        assert_eq!(normalize_path("/a//b/./c"), "a/b/c");
        assert_eq!(normalize_path("a\\b.yaml"), "a/b.yaml");
        assert_eq!(normalize_path("../x.raml"), "x.raml");
    }

    #[test]
    fn join_relative_uses_origin_directory() {
        assert_eq!(join_relative("api/main.raml", "types/user.raml"), "api/types/user.raml");
        assert_eq!(join_relative("api/main.raml", "../common.raml"), "common.raml");
        assert_eq!(join_relative("main.raml", "./lib.raml"), "lib.raml");
        assert_eq!(join_relative("a/b/main.raml", "/root.raml"), "root.raml");
    }

    #[test]
    fn path_equivalent_keys_collapse() {
        let files = FileSet::new()
            .with_file("./a/b.raml", "one")
            .with_file("a/x/../b.raml", "two");
        assert_eq!(files.len(), 1);
        assert_eq!(files.get("a/b.raml"), Some("two"));
    }

    #[test]
    fn resolve_falls_back_to_suffix_search() {
        let files = FileSet::new().with_file("project/types/user.raml", "User");
        let (path, text) = files.resolve("api.raml", "types/user.raml").unwrap();
        assert_eq!(path, "project/types/user.raml");
        assert_eq!(text, "User");
    }

    #[test]
    fn suffix_search_respects_segment_boundary() {
        let files = FileSet::new().with_file("superuser.raml", "x");
        assert!(files.find_by_suffix("user.raml").is_none());
    }

    #[test]
    fn documentation_paths_detected() {
        assert!(is_documentation_path("docs/intro.md"));
        assert!(is_documentation_path("api/Documentation/overview.raml"));
        assert!(!is_documentation_path("types/docs.raml"));
    }
}
