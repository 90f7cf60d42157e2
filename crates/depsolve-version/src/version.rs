//! The version sum type: branches, plain tags, semver, and raw revisions.

use semver::Version as SemverVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, immutable VCS identifier (a commit hash, usually).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(pub String);

impl Revision {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Revision {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A top-level, unpaired version: a branch name, an opaque plain tag, or a
/// parsed semver. This is the "floating" half of a [`Version`] before it has
/// been coupled with the revision it resolves to right now.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnpairedVersion {
    /// A named branch, e.g. `master`. `is_default` marks the repository's
    /// default branch (typically whatever `HEAD` points at upstream).
    Branch { name: String, is_default: bool },
    /// An opaque tag that does not parse as semver, e.g. `release-2019-01`.
    Plain(String),
    /// A parsed semantic version, e.g. `v1.2.3-rc.1+build5`.
    Semver(SemverVersion),
}

impl UnpairedVersion {
    pub fn branch(name: impl Into<String>) -> Self {
        Self::Branch {
            name: name.into(),
            is_default: false,
        }
    }

    pub fn default_branch(name: impl Into<String>) -> Self {
        Self::Branch {
            name: name.into(),
            is_default: true,
        }
    }

    pub fn plain(tag: impl Into<String>) -> Self {
        Self::Plain(tag.into())
    }

    pub fn semver(v: SemverVersion) -> Self {
        Self::Semver(v)
    }

    pub fn is_default_branch(&self) -> bool {
        matches!(self, Self::Branch { is_default: true, .. })
    }

    /// Couple this version with the revision it currently resolves to.
    pub fn pair(self, revision: Revision) -> PairedVersion {
        PairedVersion {
            unpaired: self,
            revision,
        }
    }
}

impl fmt::Display for UnpairedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch { name, .. } => write!(f, "{}", name),
            Self::Plain(tag) => write!(f, "{}", tag),
            Self::Semver(v) => write!(f, "{}", v),
        }
    }
}

/// An [`UnpairedVersion`] coupled with the revision it resolves to. The gps
/// literature calls this a "paired version" — most of the solver works on
/// these rather than bare unpaired versions, since the revision is what
/// actually gets checked out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairedVersion {
    unpaired: UnpairedVersion,
    revision: Revision,
}

impl PairedVersion {
    pub fn new(unpaired: UnpairedVersion, revision: Revision) -> Self {
        Self { unpaired, revision }
    }

    /// Recover the top-level version, discarding the revision.
    pub fn unpair(&self) -> &UnpairedVersion {
        &self.unpaired
    }

    /// Recover the underlying revision.
    pub fn revision(&self) -> &Revision {
        &self.revision
    }
}

impl fmt::Display for PairedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.unpaired, self.revision)
    }
}

/// Sum type over every way a dependency may pin down a concrete version.
///
/// A `Version` is exactly the closed family described by spec §3: a branch,
/// a plain tag, a parsed semver, a bare revision, or any of the first three
/// paired with the revision it currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    Unpaired(UnpairedVersion),
    Paired(PairedVersion),
    Revision(Revision),
}

impl Version {
    pub fn branch(name: impl Into<String>) -> Self {
        Self::Unpaired(UnpairedVersion::branch(name))
    }

    pub fn plain(tag: impl Into<String>) -> Self {
        Self::Unpaired(UnpairedVersion::plain(tag))
    }

    pub fn semver(v: SemverVersion) -> Self {
        Self::Unpaired(UnpairedVersion::Semver(v))
    }

    pub fn revision(rev: impl Into<Revision>) -> Self {
        Self::Revision(rev.into())
    }

    /// Couple an unpaired version with a revision; no-op if already paired
    /// or bare-revision.
    pub fn pair(self, revision: Revision) -> Self {
        match self {
            Self::Unpaired(u) => Self::Paired(u.pair(revision)),
            other => other,
        }
    }

    /// Recover the top-level version, dropping any paired revision.
    pub fn unpair(&self) -> Version {
        match self {
            Self::Paired(p) => Self::Unpaired(p.unpair().clone()),
            other => other.clone(),
        }
    }

    /// Recover the underlying revision, if this version carries one.
    pub fn underlying_revision(&self) -> Option<&Revision> {
        match self {
            Self::Paired(p) => Some(p.revision()),
            Self::Revision(r) => Some(r),
            Self::Unpaired(_) => None,
        }
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, Self::Paired(_))
    }

    pub fn is_revision(&self) -> bool {
        matches!(self, Self::Revision(_))
    }

    pub fn as_semver(&self) -> Option<&SemverVersion> {
        match self {
            Self::Unpaired(UnpairedVersion::Semver(v)) => Some(v),
            Self::Paired(p) => match p.unpair() {
                UnpairedVersion::Semver(v) => Some(v),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_branch(&self) -> Option<(&str, bool)> {
        match self {
            Self::Unpaired(UnpairedVersion::Branch { name, is_default }) => {
                Some((name.as_str(), *is_default))
            }
            Self::Paired(p) => match p.unpair() {
                UnpairedVersion::Branch { name, is_default } => Some((name.as_str(), *is_default)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unpaired(u) => write!(f, "{}", u),
            Self::Paired(p) => write!(f, "{}", p),
            Self::Revision(r) => write!(f, "{}", r),
        }
    }
}
