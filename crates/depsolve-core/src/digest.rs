//! Input digest (spec §4.8): a SHA-256 "lock fingerprint" over every solver
//! input, in a fixed label/section order, used to decide whether a previous
//! lock is still valid without re-running the solver.

use crate::manifest::ProjectConstraint;
use crate::project::ProjectRoot;
use depsolve_version::Constraint;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// The analyzer's identity (spec §6.2); participates in the digest because
/// manifest/lock extraction is analyzer-specific.
#[derive(Debug, Clone)]
pub struct AnalyzerInfo {
    pub name: String,
    pub version: u32,
}

/// Render a constraint's "typed string": its variant tag plus its value, so
/// a semver `1.0.0` and a plain version `1.0.0` hash distinctly.
pub fn typed_constraint_string(c: &Constraint) -> String {
    match c {
        Constraint::Any => "any".to_string(),
        Constraint::None => "none".to_string(),
        Constraint::Range(r) => format!("svc-{r}"),
        Constraint::Version(v) => typed_version_string(v),
        // A resolved Union must never reach the digest; if one does, the
        // caller built the constraint set incorrectly upstream.
        Constraint::Union(_) => panic!("Constraint::Union must not reach the input digest"),
    }
}

fn typed_version_string(v: &depsolve_version::Version) -> String {
    use depsolve_version::Version;
    match v {
        Version::Revision(r) => format!("r-{r}"),
        Version::Unpaired(u) => typed_unpaired_string(u),
        Version::Paired(p) => typed_unpaired_string(p.unpair()),
    }
}

fn typed_unpaired_string(u: &depsolve_version::UnpairedVersion) -> String {
    use depsolve_version::UnpairedVersion;
    match u {
        UnpairedVersion::Branch { name, .. } => format!("b-{name}"),
        UnpairedVersion::Plain(tag) => format!("pv-{tag}"),
        UnpairedVersion::Semver(v) => format!("sv-{v}"),
    }
}

/// Compute the input digest over the canonical byte stream described in
/// spec §4.8. Pure function of its inputs: identical inputs in any
/// in-memory iteration order (callers must pre-sort by key, which
/// `BTreeMap`/`BTreeSet` already guarantee) produce a byte-identical digest.
pub fn compute_input_digest(
    applicable_constraints: &BTreeMap<ProjectRoot, ProjectConstraint>,
    overrides: &BTreeMap<ProjectRoot, ProjectConstraint>,
    ignores: &[String],
    import_set: &std::collections::BTreeSet<String>,
    requires: &[String],
    analyzer: &AnalyzerInfo,
) -> [u8; 32] {
    let mut hasher = Sha256::new();

    write_section(&mut hasher, "-CONSTRAINTS-", |h| {
        for (root, c) in applicable_constraints {
            write_line(h, root.as_str());
            write_line(h, c.source.as_ref().map(|s| s.as_str()).unwrap_or(""));
            write_line(h, &typed_constraint_string(&c.constraint));
        }
    });

    write_section(&mut hasher, "-IMPORTS/REQS-", |h| {
        let mut combined: Vec<&str> = import_set.iter().map(String::as_str).collect();
        combined.extend(requires.iter().map(String::as_str));
        combined.sort_unstable();
        combined.dedup();
        for entry in combined {
            write_line(h, entry);
        }
    });

    write_section(&mut hasher, "-IGNORES-", |h| {
        let root_prefixes: Vec<&str> = applicable_constraints.keys().map(|r| r.as_str()).collect();
        let mut filtered: Vec<&str> = ignores
            .iter()
            .map(String::as_str)
            .filter(|ig| !root_prefixes.iter().any(|r| ig.starts_with(r)))
            .collect();
        filtered.sort_unstable();
        for ig in filtered {
            write_line(h, ig);
        }
    });

    write_section(&mut hasher, "-OVERRIDES-", |h| {
        for (root, c) in overrides {
            write_line(h, root.as_str());
            write_line(h, c.source.as_ref().map(|s| s.as_str()).unwrap_or(""));
            write_line(h, &typed_constraint_string(&c.constraint));
        }
    });

    write_section(&mut hasher, "-ANALYZER-", |h| {
        write_line(h, &analyzer.name);
        write_line(h, &analyzer.version.to_string());
    });

    hasher.finalize().into()
}

fn write_section(hasher: &mut Sha256, label: &str, body: impl FnOnce(&mut Sha256)) {
    hasher.update(label.as_bytes());
    body(hasher);
}

/// Empty strings are skipped entirely — no bytes, no separator — per spec
/// §4.8.
fn write_line(hasher: &mut Sha256, s: &str) {
    if s.is_empty() {
        return;
    }
    hasher.update(s.as_bytes());
    hasher.update(b"\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ProjectConstraint;
    use depsolve_version::{Constraint, Version};
    use semver::Version as SemverVersion;
    use std::collections::BTreeSet;

    fn analyzer() -> AnalyzerInfo {
        AnalyzerInfo { name: "depsolve".into(), version: 1 }
    }

    #[test]
    fn semver_and_plain_versions_hash_distinctly() {
        let sv = Constraint::Version(Version::semver(SemverVersion::parse("1.0.0").unwrap()));
        let pv = Constraint::Version(Version::plain("1.0.0"));
        assert_ne!(typed_constraint_string(&sv), typed_constraint_string(&pv));
    }

    #[test]
    fn digest_is_deterministic_across_calls() {
        let mut constraints = BTreeMap::new();
        constraints.insert(ProjectRoot::new("a/b"), ProjectConstraint::new(Constraint::any()));
        let overrides = BTreeMap::new();
        let imports: BTreeSet<String> = ["a/b".to_string()].into_iter().collect();

        let d1 = compute_input_digest(&constraints, &overrides, &[], &imports, &[], &analyzer());
        let d2 = compute_input_digest(&constraints, &overrides, &[], &imports, &[], &analyzer());
        assert_eq!(d1, d2);
    }

    #[test]
    fn adding_an_ignore_changes_the_digest_unless_already_implied() {
        let constraints = BTreeMap::new();
        let overrides = BTreeMap::new();
        let imports = BTreeSet::new();

        let base = compute_input_digest(&constraints, &overrides, &[], &imports, &[], &analyzer());
        let with_ignore = compute_input_digest(
            &constraints,
            &overrides,
            &["new/ignore".to_string()],
            &imports,
            &[],
            &analyzer(),
        );
        assert_ne!(base, with_ignore);
    }

    #[test]
    fn ignore_already_implied_by_root_prefix_does_not_change_digest() {
        let mut constraints = BTreeMap::new();
        constraints.insert(ProjectRoot::new("a/b"), ProjectConstraint::new(Constraint::any()));
        let overrides = BTreeMap::new();
        let imports: BTreeSet<String> = ["a/b".to_string()].into_iter().collect();

        let base = compute_input_digest(&constraints, &overrides, &[], &imports, &[], &analyzer());
        // "a/b/sub" is implied by being under "a/b", so it shouldn't change the digest.
        let with_implied_ignore = compute_input_digest(
            &constraints,
            &overrides,
            &["a/b/sub".to_string()],
            &imports,
            &[],
            &analyzer(),
        );
        assert_eq!(base, with_implied_ignore);
    }

}
