use depsolve_version::{Constraint, Revision, Version};
use rstest::rstest;

#[rstest]
#[case("^1.2.0", "1.2.5", true)]
#[case("^1.2.0", "2.0.0", false)]
#[case("~1.2.0", "1.2.9", true)]
#[case("~1.2.0", "1.3.0", false)]
#[case(">=1.0.0, <2.0.0", "1.9.9", true)]
#[case(">=1.0.0, <2.0.0", "2.0.0", false)]
fn range_constraints_match_expected_versions(
    #[case] range: &str,
    #[case] version: &str,
    #[case] expect_match: bool,
) {
    let constraint = Constraint::parse_range(range).unwrap();
    let version = Version::semver(semver::Version::parse(version).unwrap());
    assert_eq!(constraint.matches(&version), expect_match);
}

#[test]
fn intersecting_overlapping_semver_ranges_narrows_the_window() {
    let a = Constraint::parse_range(">=2.0.0, <4.0.0").unwrap();
    let b = Constraint::parse_range(">=3.0.0, <5.0.0").unwrap();
    let narrowed = a.intersect(&b);

    let in_window = Version::semver(semver::Version::parse("3.1.0").unwrap());
    let below = Version::semver(semver::Version::parse("2.5.0").unwrap());
    assert!(narrowed.matches(&in_window));
    assert!(!narrowed.matches(&below));
}

#[test]
fn disjoint_semver_ranges_have_no_solution() {
    let a = Constraint::parse_range(">=1.0.0, <2.0.0").unwrap();
    let b = Constraint::parse_range(">=3.0.0").unwrap();
    assert!(a.intersect(&b).is_none());
    assert!(!a.matches_any(&b));
}

#[test]
fn branch_and_tag_intersect_only_through_a_shared_revision() {
    let rev = Revision::new("cafef00d");
    let branch = Constraint::version(Version::branch("master").pair(rev.clone()));
    let tag = Constraint::version(Version::plain("v2").pair(rev.clone()));

    let different_rev_tag =
        Constraint::version(Version::plain("v3").pair(Revision::new("other")));

    assert_eq!(branch.intersect(&tag), Constraint::version(Version::Revision(rev)));
    assert!(branch.intersect(&different_rev_tag).is_none());
}

#[test]
fn upgrade_and_downgrade_orders_agree_on_non_semver_ladder() {
    use depsolve_version::{sort_for_downgrade, sort_for_upgrade};

    let mut by_upgrade = vec![
        Version::revision("r1"),
        Version::plain("release-a"),
        Version::branch("feature/y"),
    ];
    let mut by_downgrade = by_upgrade.clone();
    sort_for_upgrade(&mut by_upgrade);
    sort_for_downgrade(&mut by_downgrade);
    assert_eq!(by_upgrade, by_downgrade);
}
