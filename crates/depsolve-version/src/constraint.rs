//! Constraint algebra: `any`, `none`, a single concrete version, a semver
//! range, and the internal multi-version union used while folding branch and
//! tag siblings that happen to share a revision.

use crate::range::SemverRange;
use crate::version::{Revision, Version};
use std::fmt;

/// A constraint admits some subset of [`Version`]s.
///
/// `Union` is an implementation detail of [`intersect`](Constraint::intersect):
/// it represents "this revision is known under several top-level versions"
/// (e.g. a tag and a branch that both point at the same commit). It must
/// never be constructed directly by callers and must never reach a public
/// surface unresolved — asking for its type tag or string form is a
/// programmer error and panics, the same way the teacher's conflict
/// resolution refuses to stringify an internal-only variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Any,
    None,
    Version(Version),
    Range(SemverRange),
    Union(Vec<Version>),
}

impl Constraint {
    pub fn any() -> Self {
        Self::Any
    }

    pub fn none() -> Self {
        Self::None
    }

    pub fn version(v: Version) -> Self {
        Self::Version(v)
    }

    pub fn range(r: SemverRange) -> Self {
        Self::Range(r)
    }

    pub fn parse_range(s: &str) -> Option<Self> {
        SemverRange::parse(s).map(Self::Range)
    }

    pub(crate) fn union(versions: Vec<Version>) -> Self {
        Self::Union(versions)
    }

    /// A human/programmer-facing tag naming the active variant. Panics on
    /// `Union`, which must be resolved internally before it's inspected.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::None => "none",
            Self::Version(_) => "version",
            Self::Range(_) => "range",
            Self::Union(_) => panic!("Constraint::Union has no type tag; it must be resolved via intersect() before inspection"),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Does this constraint admit `v`?
    pub fn matches(&self, v: &Version) -> bool {
        !self.intersect(&Self::Version(v.clone())).is_none()
    }

    /// Do these two constraints admit any version in common?
    pub fn matches_any(&self, other: &Constraint) -> bool {
        !self.intersect(other).is_none()
    }

    /// Intersect two constraints, following the cross-type rules:
    ///
    /// - `any` is the identity, `none` the absorbing element.
    /// - Two ranges intersect to their overlapping window (or `none` if
    ///   disjoint), collapsing to a single `Version` when the window shrinks
    ///   to one point.
    /// - A branch never matches a plain tag, and neither matches a semver,
    ///   *unless* they share an underlying revision, in which case the
    ///   intersection is that shared [`Revision`] — the two top-level
    ///   versions are different names for the same checked-out content.
    /// - A range only admits a branch/plain/revision version when that
    ///   version carries a paired semver that falls in range.
    pub fn intersect(&self, other: &Constraint) -> Constraint {
        match (self, other) {
            (Self::Any, x) | (x, Self::Any) => x.clone(),
            (Self::None, _) | (_, Self::None) => Self::None,

            (Self::Range(a), Self::Range(b)) => match a.intersect(b) {
                None => Self::None,
                Some(r) => match r.as_singleton() {
                    Some(v) => Self::Version(Version::semver(v)),
                    None => Self::Range(r),
                },
            },

            (Self::Version(a), Self::Version(b)) => intersect_versions(a, b),

            (Self::Version(v), Self::Range(r)) | (Self::Range(r), Self::Version(v)) => {
                intersect_version_with_range(v, r)
            }

            (Self::Union(vs), Self::Version(v)) | (Self::Version(v), Self::Union(vs)) => vs
                .iter()
                .map(|candidate| intersect_versions(candidate, v))
                .find(|c| !c.is_none())
                .unwrap_or(Self::None),

            (Self::Union(vs), Self::Range(r)) | (Self::Range(r), Self::Union(vs)) => vs
                .iter()
                .filter_map(|candidate| match intersect_version_with_range(candidate, r) {
                    Self::None => None,
                    other => Some(other),
                })
                .next()
                .unwrap_or(Self::None),

            (Self::Union(a), Self::Union(b)) => a
                .iter()
                .flat_map(|x| b.iter().map(move |y| intersect_versions(x, y)))
                .find(|c| !c.is_none())
                .unwrap_or(Self::None),
        }
    }
}

fn versions_equal(a: &Version, b: &Version) -> bool {
    a.unpair() == b.unpair()
        || match (a.as_semver(), b.as_semver()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
}

fn shared_revision<'a>(a: &'a Version, b: &'a Version) -> Option<&'a Revision> {
    match (a.underlying_revision(), b.underlying_revision()) {
        (Some(x), Some(y)) if x == y => Some(x),
        _ => None,
    }
}

fn intersect_versions(a: &Version, b: &Version) -> Constraint {
    if versions_equal(a, b) {
        return Constraint::Version(a.clone());
    }
    if let Some(rev) = shared_revision(a, b) {
        return Constraint::Version(Version::Revision(rev.clone()));
    }
    Constraint::None
}

fn intersect_version_with_range(v: &Version, r: &SemverRange) -> Constraint {
    match v.as_semver() {
        Some(sv) if r.matches(sv) => Constraint::Version(v.clone()),
        _ => Constraint::None,
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::None => write!(f, "<none>"),
            Self::Version(v) => write!(f, "{}", v),
            Self::Range(r) => write!(f, "{}", r),
            Self::Union(_) => panic!("Constraint::Union has no string form; it must be resolved via intersect() before display"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version as SemverVersion;

    fn semver(s: &str) -> Version {
        Version::semver(SemverVersion::parse(s).unwrap())
    }

    #[test]
    fn any_is_identity() {
        let r = Constraint::parse_range(">=1.0.0").unwrap();
        assert_eq!(Constraint::Any.intersect(&r), r);
        assert_eq!(r.intersect(&Constraint::Any), r);
    }

    #[test]
    fn none_absorbs() {
        let r = Constraint::parse_range(">=1.0.0").unwrap();
        assert!(Constraint::None.intersect(&r).is_none());
        assert!(r.intersect(&Constraint::None).is_none());
    }

    #[test]
    fn branch_and_plain_tag_never_match_without_shared_revision() {
        let branch = Constraint::Version(Version::branch("master"));
        let tag = Constraint::Version(Version::plain("v1"));
        assert!(branch.intersect(&tag).is_none());
    }

    #[test]
    fn branch_and_plain_tag_intersect_to_shared_revision() {
        let rev = Revision::new("abc123");
        let branch = Constraint::Version(Version::branch("master").pair(rev.clone()));
        let tag = Constraint::Version(Version::plain("v1").pair(rev.clone()));
        assert_eq!(branch.intersect(&tag), Constraint::Version(Version::Revision(rev)));
    }

    #[test]
    fn range_never_matches_bare_branch() {
        let range = Constraint::parse_range(">=1.0.0").unwrap();
        let branch = Constraint::Version(Version::branch("master"));
        assert!(range.intersect(&branch).is_none());
    }

    #[test]
    fn range_matches_paired_semver_on_a_union_member() {
        let range = Constraint::parse_range(">=1.0.0, <2.0.0").unwrap();
        let rev = Revision::new("deadbeef");
        let union = Constraint::union(vec![
            Version::branch("master").pair(rev.clone()),
            semver("1.5.0").pair(rev),
        ]);
        let got = range.intersect(&union);
        assert!(!got.is_none());
    }

    #[test]
    fn overlapping_ranges_intersect() {
        let a = Constraint::parse_range(">=2.0.0, <4.0.0").unwrap();
        let b = Constraint::parse_range(">=3.0.0, <5.0.0").unwrap();
        let i = a.intersect(&b);
        assert!(i.matches(&semver("3.5.0")));
        assert!(!i.matches(&semver("4.0.0")));
    }

    #[test]
    fn ranges_collapse_to_a_single_version() {
        let a = Constraint::parse_range(">=1.0.0").unwrap();
        let b = Constraint::Version(semver("1.0.0"));
        assert_eq!(a.intersect(&b), Constraint::Version(semver("1.0.0")));
    }

    #[test]
    #[should_panic]
    fn union_type_tag_panics() {
        Constraint::union(vec![Version::branch("x")]).type_tag();
    }

    #[test]
    fn matches_any_agrees_with_intersect() {
        let a = Constraint::parse_range(">=1.0.0, <2.0.0").unwrap();
        let b = Constraint::parse_range(">=3.0.0").unwrap();
        assert_eq!(a.matches_any(&b), !a.intersect(&b).is_none());
    }
}
