//! Lock and LockedProject (spec §3): the persisted, exact solution of a
//! solve — a project identifier, the version/revision it was pinned to, and
//! the packages of it actually used.

use crate::project::ProjectIdentifier;
use depsolve_version::{Revision, Version};
use std::fmt;

pub mod diff;
pub use diff::{diff_locks, LockDiff, ProjectDiff, StringDiff};

/// `(ProjectIdentifier, version?, revision, packages)`. At least one of
/// (version, revision) must be present — enforced at construction, per spec
/// §3 Invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProject {
    pub project: ProjectIdentifier,
    version: Option<Version>,
    revision: Revision,
    packages: Vec<String>,
}

/// A `LockedProject` cannot be built without a version and/or a revision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("LockedProject for {project} requires a version or a revision, got neither")]
pub struct MissingVersionError {
    pub project: ProjectIdentifier,
}

impl LockedProject {
    /// Build from an explicit revision plus an optional top-level version.
    /// Packages are sorted and deduplicated on construction so equality and
    /// ordered comparison are well-defined.
    pub fn new(
        project: ProjectIdentifier,
        version: Option<Version>,
        revision: Option<Revision>,
        mut packages: Vec<String>,
    ) -> Result<Self, MissingVersionError> {
        let revision = match (version.clone(), revision) {
            (_, Some(r)) => r,
            (Some(ref v), None) => match v.underlying_revision() {
                Some(r) => r.clone(),
                None => return Err(MissingVersionError { project }),
            },
            (None, None) => return Err(MissingVersionError { project }),
        };
        packages.sort();
        packages.dedup();
        Ok(Self {
            project,
            version,
            revision,
            packages,
        })
    }

    /// Assemble the richest form available: `version.pair(revision)` when
    /// both a top-level version and a revision are known, else whichever is
    /// present.
    pub fn version(&self) -> Version {
        match &self.version {
            Some(v) if !v.is_revision() => v.clone().pair(self.revision.clone()),
            Some(v) => v.clone(),
            None => Version::Revision(self.revision.clone()),
        }
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }
}

impl fmt::Display for LockedProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.project, self.version())
    }
}

/// `(input_hash, [LockedProject])`. Equality is structural: package lists
/// compared as ordered sequences, revisions as exact strings (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    pub input_hash: [u8; 32],
    pub projects: Vec<LockedProject>,
}

impl Lock {
    pub fn new(input_hash: [u8; 32], mut projects: Vec<LockedProject>) -> Self {
        sort_locked_projects(&mut projects);
        Self { input_hash, projects }
    }

    pub fn input_hash_hex(&self) -> String {
        hex::encode(self.input_hash)
    }

    pub fn project(&self, root: &crate::project::ProjectRoot) -> Option<&LockedProject> {
        self.projects.iter().find(|p| &p.project.root == root)
    }
}

/// Sort locked projects by project-root, for deterministic output (spec
/// §6.4).
pub fn sort_locked_projects(projects: &mut [LockedProject]) {
    projects.sort_by(|a, b| a.project.root.cmp(&b.project.root));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectRoot;
    use semver::Version as SemverVersion;

    fn project(root: &str) -> ProjectIdentifier {
        ProjectIdentifier::from_root(root)
    }

    #[test]
    fn construction_fails_without_version_or_revision() {
        let err = LockedProject::new(project("a"), None, None, vec![]).unwrap_err();
        assert_eq!(err.project, project("a"));
    }

    #[test]
    fn version_assembles_paired_form_when_both_present() {
        let lp = LockedProject::new(
            project("a"),
            Some(Version::semver(SemverVersion::parse("1.0.0").unwrap())),
            Some(Revision::new("deadbeef")),
            vec!["a".into()],
        )
        .unwrap();
        assert!(lp.version().is_paired());
    }

    #[test]
    fn round_trips_through_version_and_equality() {
        let lp = LockedProject::new(
            project("a"),
            Some(Version::plain("v1")),
            Some(Revision::new("rev1")),
            vec!["a".into(), "a/sub".into()],
        )
        .unwrap();
        let lp2 = lp.clone();
        assert_eq!(lp, lp2);
        assert_eq!(lp.version(), lp2.version());
    }

    #[test]
    fn packages_are_sorted_and_deduplicated() {
        let lp = LockedProject::new(
            project("a"),
            None,
            Some(Revision::new("r")),
            vec!["z".into(), "a".into(), "a".into()],
        )
        .unwrap();
        assert_eq!(lp.packages(), &["a".to_string(), "z".to_string()]);
    }

    #[test]
    fn sort_locked_projects_orders_by_root() {
        let mut projects = vec![
            LockedProject::new(project("z"), None, Some(Revision::new("r")), vec![]).unwrap(),
            LockedProject::new(project("a"), None, Some(Revision::new("r")), vec![]).unwrap(),
        ];
        sort_locked_projects(&mut projects);
        assert_eq!(projects[0].project, project("a"));
    }
}
