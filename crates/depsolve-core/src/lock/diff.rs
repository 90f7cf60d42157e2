//! Lock diffing (spec §4.10): compare two locks project-by-project so a
//! caller can render "what would change" without re-running the solver.

use super::{Lock, LockedProject};
use crate::project::ProjectRoot;
use std::collections::BTreeMap;
use std::fmt;

/// A single-field before/after, rendered the way a CLI would print it:
/// `value` when unchanged, `+ value` / `- value` when it appeared or
/// disappeared, `old -> new` when it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringDiff {
    Unchanged(String),
    Added(String),
    Removed(String),
    Modified(String, String),
}

impl StringDiff {
    /// `None` when both sides are absent — there's nothing to show.
    pub fn of(previous: Option<&str>, current: Option<&str>) -> Option<Self> {
        match (previous, current) {
            (None, None) => None,
            (None, Some(c)) => Some(Self::Added(c.to_string())),
            (Some(p), None) => Some(Self::Removed(p.to_string())),
            (Some(p), Some(c)) if p == c => Some(Self::Unchanged(p.to_string())),
            (Some(p), Some(c)) => Some(Self::Modified(p.to_string(), c.to_string())),
        }
    }

    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

impl fmt::Display for StringDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged(v) => write!(f, "{v}"),
            Self::Added(v) => write!(f, "+ {v}"),
            Self::Removed(v) => write!(f, "- {v}"),
            Self::Modified(p, c) => write!(f, "{p} -> {c}"),
        }
    }
}

fn joined_sorted_set(packages: &[String]) -> String {
    let mut sorted: Vec<&str> = packages.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(", ")
}

/// Per-field diff for one project-root present in both locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDiff {
    pub source: Option<StringDiff>,
    pub version: Option<StringDiff>,
    pub revision: Option<StringDiff>,
    pub branch: Option<StringDiff>,
    pub packages: Option<StringDiff>,
}

impl ProjectDiff {
    fn of(previous: &LockedProject, current: &LockedProject) -> Self {
        let prev_branch = previous.version().as_branch().map(|(n, _)| n.to_string());
        let curr_branch = current.version().as_branch().map(|(n, _)| n.to_string());
        let prev_packages = joined_sorted_set(previous.packages());
        let curr_packages = joined_sorted_set(current.packages());

        Self {
            source: StringDiff::of(
                previous.project.source.as_ref().map(|s| s.as_str()),
                current.project.source.as_ref().map(|s| s.as_str()),
            ),
            version: StringDiff::of(
                Some(&previous.version().to_string()),
                Some(&current.version().to_string()),
            ),
            revision: StringDiff::of(
                Some(previous.revision().as_str()),
                Some(current.revision().as_str()),
            ),
            branch: StringDiff::of(prev_branch.as_deref(), curr_branch.as_deref()),
            packages: StringDiff::of(Some(&prev_packages), Some(&curr_packages)),
        }
    }

    /// Whether any field actually differs between the two sides.
    pub fn has_changes(&self) -> bool {
        [&self.source, &self.version, &self.revision, &self.branch, &self.packages]
            .into_iter()
            .flatten()
            .any(StringDiff::is_changed)
    }
}

/// The result of comparing two locks: which projects were added, removed, or
/// retained-but-changed, plus the input-hash diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockDiff {
    pub added: Vec<ProjectRoot>,
    pub removed: Vec<ProjectRoot>,
    /// Every common project-root, whether or not it actually changed — a
    /// caller filters on [`ProjectDiff::has_changes`] if it only wants the
    /// ones that moved.
    pub changed: BTreeMap<ProjectRoot, ProjectDiff>,
    pub input_hash: StringDiff,
}

/// `nil` (`None`) only when both locks are absent; a brand-new lock diffs
/// against an absent previous one with every project showing as added.
pub fn diff_locks(previous: Option<&Lock>, current: Option<&Lock>) -> Option<LockDiff> {
    if previous.is_none() && current.is_none() {
        return None;
    }

    let empty: Vec<LockedProject> = Vec::new();
    let prev_projects = previous.map(|l| l.projects.as_slice()).unwrap_or(&empty);
    let curr_projects = current.map(|l| l.projects.as_slice()).unwrap_or(&empty);

    let prev_by_root: BTreeMap<&ProjectRoot, &LockedProject> =
        prev_projects.iter().map(|p| (&p.project.root, p)).collect();
    let curr_by_root: BTreeMap<&ProjectRoot, &LockedProject> =
        curr_projects.iter().map(|p| (&p.project.root, p)).collect();

    let added = curr_by_root
        .keys()
        .filter(|root| !prev_by_root.contains_key(*root))
        .map(|root| (*root).clone())
        .collect();
    let removed = prev_by_root
        .keys()
        .filter(|root| !curr_by_root.contains_key(*root))
        .map(|root| (*root).clone())
        .collect();

    let mut changed = BTreeMap::new();
    for (root, prev) in &prev_by_root {
        if let Some(curr) = curr_by_root.get(root) {
            changed.insert((*root).clone(), ProjectDiff::of(prev, curr));
        }
    }

    let prev_hash = previous.map(|l| l.input_hash_hex());
    let curr_hash = current.map(|l| l.input_hash_hex());
    let input_hash = StringDiff::of(prev_hash.as_deref(), curr_hash.as_deref())
        .unwrap_or_else(|| StringDiff::Unchanged(String::new()));

    Some(LockDiff { added, removed, changed, input_hash })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectIdentifier;
    use depsolve_version::Revision;

    fn locked(root: &str, revision: &str, packages: &[&str]) -> LockedProject {
        LockedProject::new(
            ProjectIdentifier::from_root(root),
            None,
            Some(Revision::new(revision)),
            packages.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn both_absent_yields_no_diff() {
        assert!(diff_locks(None, None).is_none());
    }

    #[test]
    fn brand_new_lock_shows_every_project_as_added() {
        let current = Lock::new([1u8; 32], vec![locked("example.org/a", "r1", &["example.org/a"])]);
        let diff = diff_locks(None, Some(&current)).unwrap();
        assert_eq!(diff.added, vec![ProjectRoot::new("example.org/a")]);
        assert!(diff.removed.is_empty());
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn removed_project_shows_up_once() {
        let previous = Lock::new([1u8; 32], vec![locked("example.org/a", "r1", &["example.org/a"])]);
        let diff = diff_locks(Some(&previous), None).unwrap();
        assert_eq!(diff.removed, vec![ProjectRoot::new("example.org/a")]);
    }

    #[test]
    fn revision_bump_is_reported_as_modified() {
        let previous = Lock::new([1u8; 32], vec![locked("example.org/a", "r1", &["example.org/a"])]);
        let current = Lock::new([2u8; 32], vec![locked("example.org/a", "r2", &["example.org/a"])]);
        let diff = diff_locks(Some(&previous), Some(&current)).unwrap();
        let project_diff = &diff.changed[&ProjectRoot::new("example.org/a")];
        assert!(project_diff.has_changes());
        assert_eq!(project_diff.revision, Some(StringDiff::Modified("r1".into(), "r2".into())));
        assert!(matches!(diff.input_hash, StringDiff::Modified(_, _)));
    }

    #[test]
    fn unchanged_project_reports_no_changes() {
        let lock = Lock::new([1u8; 32], vec![locked("example.org/a", "r1", &["example.org/a"])]);
        let diff = diff_locks(Some(&lock), Some(&lock)).unwrap();
        assert!(!diff.changed[&ProjectRoot::new("example.org/a")].has_changes());
        assert!(matches!(diff.input_hash, StringDiff::Unchanged(_)));
    }

    #[test]
    fn package_list_diff_ignores_reordering() {
        let previous = locked("example.org/a", "r1", &["b", "a"]);
        let current = locked("example.org/a", "r1", &["a", "b"]);
        let pd = ProjectDiff::of(&previous, &current);
        assert!(matches!(pd.packages, Some(StringDiff::Unchanged(_))));
    }
}
