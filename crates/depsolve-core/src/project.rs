//! Project identity (spec §3 "Project identifier"): a canonical import root
//! paired with an optional alternate upstream locator, compared case-fold.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical import path a project's code is rooted at, e.g.
/// `example.org/a/b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRoot(String);

impl ProjectRoot {
    pub fn new(root: impl Into<String>) -> Self {
        Self(root.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for all comparisons and hashing. Imports are
    /// case-insensitive across the system (spec §3 Invariants); conflicts
    /// between case variants are caught separately, at the point an import
    /// is ingested, rather than silently here.
    fn fold_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for ProjectRoot {
    fn eq(&self, other: &Self) -> bool {
        self.fold_key() == other.fold_key()
    }
}
impl Eq for ProjectRoot {}

impl std::hash::Hash for ProjectRoot {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fold_key().hash(state);
    }
}

impl PartialOrd for ProjectRoot {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ProjectRoot {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fold_key().cmp(&other.fold_key())
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectRoot {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An alternate upstream locator (a URL) that overrides the default source
/// derived from a [`ProjectRoot`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Source(String);

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(ProjectRoot, Source?)`. Equality and ordering respect both fields;
/// [`normalized_source`](Self::normalized_source) is what gateway/coordinator
/// lookups key on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectIdentifier {
    pub root: ProjectRoot,
    pub source: Option<Source>,
}

impl ProjectIdentifier {
    pub fn new(root: ProjectRoot, source: Option<Source>) -> Self {
        Self { root, source }
    }

    pub fn from_root(root: impl Into<String>) -> Self {
        Self::new(ProjectRoot::new(root), None)
    }

    /// The string lookups key on: the explicit source if set, else the
    /// project root.
    pub fn normalized_source(&self) -> &str {
        match &self.source {
            Some(s) => s.as_str(),
            None => self.root.as_str(),
        }
    }
}

impl fmt::Display for ProjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(s) => write!(f, "{} ({})", self.root, s),
            None => write!(f, "{}", self.root),
        }
    }
}

/// Case-fold an import path the way [`ProjectRoot`] equality does, for use
/// wherever an import set is deduplicated/compared outside of a
/// `ProjectRoot` (e.g. the reach map, which works over raw path strings).
pub fn fold_case(path: &str) -> String {
    path.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_compare_case_insensitively() {
        assert_eq!(ProjectRoot::new("Example.org/A"), ProjectRoot::new("example.org/a"));
    }

    #[test]
    fn identifier_equality_respects_source() {
        let a = ProjectIdentifier::new(ProjectRoot::new("x/y"), None);
        let b = ProjectIdentifier::new(ProjectRoot::new("x/y"), Some(Source::new("https://fork")));
        assert_ne!(a, b);
    }

    #[test]
    fn normalized_source_prefers_explicit_source() {
        let id = ProjectIdentifier::new(ProjectRoot::new("x/y"), Some(Source::new("https://fork")));
        assert_eq!(id.normalized_source(), "https://fork");
        let id2 = ProjectIdentifier::new(ProjectRoot::new("x/y"), None);
        assert_eq!(id2.normalized_source(), "x/y");
    }
}
