//! Total orders over [`Version`] for the solver's choice rule: upgrade order
//! (try newest/most-preferred first) and downgrade order (try oldest first),
//! per spec §4.1.
//!
//! Both orders agree on everything except semver direction: non-semver
//! versions always rank by the same category ladder (default branch, other
//! branches by name, plain tags by name, bare revisions by string), with a
//! final lexicographic tie-break on the rendered string. Semver itself
//! orders by the crate's own `Ord` impl (which already gives pre-releases
//! lower precedence than their associated release, per the semver spec),
//! just run forwards for upgrade and backwards for downgrade.

use crate::version::{PairedVersion, Version};
use std::cmp::Ordering;

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Semver,
    DefaultBranch,
    OtherBranch,
    Plain,
    Revision,
}

fn rank(v: &Version) -> Rank {
    if v.as_semver().is_some() {
        return Rank::Semver;
    }
    match v.as_branch() {
        Some((_, true)) => Rank::DefaultBranch,
        Some((_, false)) => Rank::OtherBranch,
        None if v.is_revision() => Rank::Revision,
        None => Rank::Plain,
    }
}

fn non_semver_key(v: &Version) -> String {
    v.to_string()
}

/// Order two versions for upgrade preference: `Less` means `a` should be
/// tried before `b`.
pub fn upgrade_cmp(a: &Version, b: &Version) -> Ordering {
    compare(a, b, true)
}

/// Order two versions for downgrade preference: `Less` means `a` should be
/// tried before `b`.
pub fn downgrade_cmp(a: &Version, b: &Version) -> Ordering {
    compare(a, b, false)
}

fn compare(a: &Version, b: &Version, upgrade: bool) -> Ordering {
    let (ra, rb) = (rank(a), rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match ra {
        Rank::Semver => {
            let (sa, sb) = (a.as_semver().unwrap(), b.as_semver().unwrap());
            if upgrade {
                sb.cmp(sa)
            } else {
                sa.cmp(sb)
            }
        }
        _ => non_semver_key(a).cmp(&non_semver_key(b)),
    }
}

/// Sort a list into upgrade order (most preferred first) in place.
pub fn sort_for_upgrade(versions: &mut [Version]) {
    versions.sort_by(upgrade_cmp);
}

/// Sort a list into downgrade order (least preferred first) in place.
pub fn sort_for_downgrade(versions: &mut [Version]) {
    versions.sort_by(downgrade_cmp);
}

/// Same ordering as [`sort_for_upgrade`], but over the paired versions a
/// `Source::list_versions` call actually returns — the revision each one
/// carries doesn't affect its rank, only its unpaired half does.
pub fn sort_paired_for_upgrade(versions: &mut [PairedVersion]) {
    versions.sort_by(|a, b| {
        upgrade_cmp(&Version::Unpaired(a.unpair().clone()), &Version::Unpaired(b.unpair().clone()))
    });
}

/// Downgrade counterpart of [`sort_paired_for_upgrade`].
pub fn sort_paired_for_downgrade(versions: &mut [PairedVersion]) {
    versions.sort_by(|a, b| {
        downgrade_cmp(&Version::Unpaired(a.unpair().clone()), &Version::Unpaired(b.unpair().clone()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version as SemverVersion;

    fn semver(s: &str) -> Version {
        Version::semver(SemverVersion::parse(s).unwrap())
    }

    #[test]
    fn upgrade_order_prefers_newest_semver_first() {
        let mut vs = vec![semver("1.0.0"), semver("2.0.0"), semver("1.5.0")];
        sort_for_upgrade(&mut vs);
        assert_eq!(
            vs,
            vec![semver("2.0.0"), semver("1.5.0"), semver("1.0.0")]
        );
    }

    #[test]
    fn downgrade_order_prefers_oldest_semver_first() {
        let mut vs = vec![semver("1.0.0"), semver("2.0.0"), semver("1.5.0")];
        sort_for_downgrade(&mut vs);
        assert_eq!(
            vs,
            vec![semver("1.0.0"), semver("1.5.0"), semver("2.0.0")]
        );
    }

    #[test]
    fn semver_ranks_above_branches_and_tags_in_upgrade_order() {
        let mut vs = vec![
            Version::branch("feature/x"),
            semver("1.0.0"),
            Version::plain("release-1"),
        ];
        sort_for_upgrade(&mut vs);
        assert_eq!(vs[0], semver("1.0.0"));
    }

    #[test]
    fn default_branch_ranks_above_other_branches() {
        let mut vs = vec![
            Version::branch("feature/x"),
            Version::Unpaired(crate::version::UnpairedVersion::default_branch("main")),
        ];
        sort_for_upgrade(&mut vs);
        assert!(matches!(vs[0].as_branch(), Some((_, true))));
    }

    #[test]
    fn downgrade_order_keeps_the_same_non_semver_ladder_as_upgrade() {
        let mut up = vec![Version::branch("a"), Version::plain("z"), Version::revision("r")];
        let mut down = up.clone();
        sort_for_upgrade(&mut up);
        sort_for_downgrade(&mut down);
        assert_eq!(up, down);
    }

    #[test]
    fn paired_sort_ignores_revision_and_matches_unpaired_order() {
        use crate::version::{Revision, UnpairedVersion};

        let mut paired = vec![
            UnpairedVersion::semver(SemverVersion::parse("1.0.0").unwrap()).pair(Revision::new("r1")),
            UnpairedVersion::semver(SemverVersion::parse("2.0.0").unwrap()).pair(Revision::new("r2")),
        ];
        sort_paired_for_upgrade(&mut paired);
        assert_eq!(paired[0].unpair(), &UnpairedVersion::semver(SemverVersion::parse("2.0.0").unwrap()));

        sort_paired_for_downgrade(&mut paired);
        assert_eq!(paired[0].unpair(), &UnpairedVersion::semver(SemverVersion::parse("1.0.0").unwrap()));
    }
}
