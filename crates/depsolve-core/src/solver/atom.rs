//! Atoms and bimodal identifiers (spec §4.9, §9 "Cycles / back-references").
//!
//! Selected atoms live in a vector; every reference to a selected atom is
//! an index into that vector, so popping back during backtracking is just
//! a truncation.

use crate::project::ProjectIdentifier;
use depsolve_version::Version;
use std::collections::BTreeSet;

/// A concrete selection `(ProjectIdentifier, Version)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub project: ProjectIdentifier,
    pub version: Version,
}

impl Atom {
    pub fn new(project: ProjectIdentifier, version: Version) -> Self {
        Self { project, version }
    }

    pub fn root(root: ProjectIdentifier) -> Self {
        Self::new(root, Version::plain("root"))
    }
}

/// A selected atom plus the accumulated set of its packages that are
/// actually imported by the rest of the solution so far.
#[derive(Debug, Clone)]
pub struct SelectedAtom {
    pub atom: Atom,
    pub packages: BTreeSet<String>,
}

impl SelectedAtom {
    pub fn new(atom: Atom) -> Self {
        Self { atom, packages: BTreeSet::new() }
    }

    pub fn add_package(&mut self, package: impl Into<String>) -> bool {
        self.packages.insert(package.into())
    }
}

/// `(ProjectIdentifier, packages-that-must-be-importable)` — an entry on
/// the `unselected` queue (spec §4.9).
#[derive(Debug, Clone)]
pub struct BimodalIdentifier {
    pub project: ProjectIdentifier,
    pub packages: BTreeSet<String>,
}

impl BimodalIdentifier {
    pub fn new(project: ProjectIdentifier) -> Self {
        Self { project, packages: BTreeSet::new() }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.packages.insert(package.into());
        self
    }

    pub fn merge_packages(&mut self, other: impl IntoIterator<Item = String>) {
        self.packages.extend(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectRoot;

    #[test]
    fn selected_atom_tracks_unique_packages() {
        let mut sa = SelectedAtom::new(Atom::new(
            ProjectIdentifier::new(ProjectRoot::new("a"), None),
            Version::plain("v1"),
        ));
        assert!(sa.add_package("a/pkg"));
        assert!(!sa.add_package("a/pkg"));
        assert_eq!(sa.packages.len(), 1);
    }
}
