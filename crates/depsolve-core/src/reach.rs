//! Reach map (spec §4.2): for a package tree, the transitive closure of
//! external imports reachable from each internal package.

use crate::package_tree::PackageTree;
use std::collections::{BTreeMap, BTreeSet};

/// A single (possibly wildcarded) ignore pattern, e.g. `foo/bar` (exact) or
/// `foo/*` (prefix wildcard).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IgnorePattern(String);

impl IgnorePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn matches(&self, import_path: &str) -> bool {
        match self.0.strip_suffix("/*") {
            Some(prefix) => import_path == prefix || import_path.starts_with(&format!("{prefix}/")),
            None => import_path == self.0,
        }
    }
}

/// Is `import_path`'s first path segment free of a dot? That's the spec's
/// (and Go's) heuristic for "this is the standard library, not a project".
pub fn is_stdlib_import(import_path: &str) -> bool {
    let first_segment = import_path.split('/').next().unwrap_or(import_path);
    !first_segment.contains('.')
}

fn is_ignored(import_path: &str, ignores: &[IgnorePattern]) -> bool {
    ignores.iter().any(|pat| pat.matches(import_path))
}

/// `package-path -> transitive external imports reachable from it`, per
/// spec §3/§4.2. Packages that errored in the source tree are propagated as
/// errors rather than silently omitted from the map.
#[derive(Debug, Clone, Default)]
pub struct ReachMap {
    pub external: BTreeMap<String, BTreeSet<String>>,
    pub errors: BTreeMap<String, String>,
}

impl ReachMap {
    /// External imports reachable from `package_path`, or empty if the
    /// package isn't present (e.g. it errored).
    pub fn reachable_from(&self, package_path: &str) -> BTreeSet<String> {
        self.external.get(package_path).cloned().unwrap_or_default()
    }

    /// Union of every package's external imports — "what this whole project
    /// could ever need", used when no subset of packages narrows things.
    pub fn all_external(&self) -> BTreeSet<String> {
        self.external.values().flatten().cloned().collect()
    }
}

/// Compute the reach map for `tree`, applying `ignores` and dropping
/// standard-library imports, per the five steps in spec §4.2.
///
/// Internal import cycles are tolerated: direct-import adjacency is computed
/// first, then the transitive closure is taken via fixpoint iteration, which
/// naturally collapses cycles (a package's external set stabilizes once no
/// more neighbors contribute anything new).
pub fn compute_reach_map(tree: &PackageTree, ignores: &[IgnorePattern]) -> ReachMap {
    compute_reach_map_inner(tree, ignores, false)
}

/// Same as [`compute_reach_map`] but additionally folds in each package's
/// test-only imports — the "flatten" pass from spec §4.2's final paragraph.
pub fn compute_reach_map_with_tests(tree: &PackageTree, ignores: &[IgnorePattern]) -> ReachMap {
    compute_reach_map_inner(tree, ignores, true)
}

fn compute_reach_map_inner(tree: &PackageTree, ignores: &[IgnorePattern], include_tests: bool) -> ReachMap {
    let mut map = ReachMap::default();
    for (path, reason) in tree.errors() {
        map.errors.insert(path.to_string(), reason.to_string());
    }

    // Step 1-3: direct external imports (internal edges kept separate).
    let mut direct_external: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut internal_edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    let internal_paths: BTreeSet<&str> = tree.package_paths().collect();

    for path in tree.package_paths() {
        let Some(pkg) = tree.package(path) else {
            continue;
        };
        let mut imports: Vec<&str> = pkg.imports.iter().map(|s| s.as_str()).collect();
        if include_tests {
            imports.extend(pkg.test_imports.iter().map(|s| s.as_str()));
        }

        let mut ext = BTreeSet::new();
        let mut internal = BTreeSet::new();
        for import in imports {
            if is_stdlib_import(import) {
                continue;
            }
            if is_ignored(import, ignores) {
                continue;
            }
            if internal_paths.contains(import) {
                internal.insert(import.to_string());
            } else {
                ext.insert(import.to_string());
            }
        }
        direct_external.insert(path.to_string(), ext);
        internal_edges.insert(path.to_string(), internal);
    }

    // Step 4-5: transitive closure over internal edges via fixpoint.
    let mut external = direct_external;
    let mut changed = true;
    while changed {
        changed = false;
        let snapshot = external.clone();
        for (path, internal) in &internal_edges {
            let mut union = snapshot.get(path).cloned().unwrap_or_default();
            let before_len = union.len();
            for neighbor in internal {
                if let Some(neighbor_ext) = snapshot.get(neighbor) {
                    union.extend(neighbor_ext.iter().cloned());
                }
            }
            if union.len() != before_len {
                changed = true;
            }
            external.insert(path.clone(), union);
        }
    }

    map.external = external;
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_tree::Package;

    #[test]
    fn stdlib_imports_are_dropped() {
        assert!(is_stdlib_import("fmt"));
        assert!(is_stdlib_import("net/http"));
        assert!(!is_stdlib_import("example.org/a"));
    }

    #[test]
    fn wildcard_ignore_matches_subpackages() {
        let pat = IgnorePattern::new("foo/*");
        assert!(pat.matches("foo/bar"));
        assert!(pat.matches("foo"));
        assert!(!pat.matches("foobar"));
    }

    #[test]
    fn transitive_closure_propagates_through_internal_imports() {
        // a -> root/foo (internal) -> external/b
        let mut tree = PackageTree::new("root");
        tree.insert_package(
            "root/a",
            Package::new("a", "root/a").with_imports(vec!["root/foo".into()]),
        );
        tree.insert_package(
            "root/foo",
            Package::new("foo", "root/foo").with_imports(vec!["external/b".into()]),
        );
        let reach = compute_reach_map(&tree, &[]);
        assert!(reach.reachable_from("root/a").contains("external/b"));
    }

    #[test]
    fn internal_cycles_do_not_infinite_loop_and_collapse() {
        let mut tree = PackageTree::new("root");
        tree.insert_package(
            "root/a",
            Package::new("a", "root/a").with_imports(vec!["root/b".into(), "external/x".into()]),
        );
        tree.insert_package(
            "root/b",
            Package::new("b", "root/b").with_imports(vec!["root/a".into(), "external/y".into()]),
        );
        let reach = compute_reach_map(&tree, &[]);
        assert!(reach.reachable_from("root/a").contains("external/x"));
        assert!(reach.reachable_from("root/a").contains("external/y"));
        assert!(reach.reachable_from("root/b").contains("external/x"));
    }

    #[test]
    fn ignored_imports_are_excluded() {
        let mut tree = PackageTree::new("root");
        tree.insert_package(
            "root/a",
            Package::new("a", "root/a").with_imports(vec!["external/x".into(), "blocked/y".into()]),
        );
        let ignores = vec![IgnorePattern::new("blocked/y")];
        let reach = compute_reach_map(&tree, &ignores);
        assert!(!reach.reachable_from("root/a").contains("blocked/y"));
        assert!(reach.reachable_from("root/a").contains("external/x"));
    }

    #[test]
    fn test_only_imports_are_excluded_unless_flattening_with_tests() {
        let mut tree = PackageTree::new("root");
        tree.insert_package(
            "root/a",
            Package::new("a", "root/a").with_test_imports(vec!["external/only-for-tests".into()]),
        );
        let reach = compute_reach_map(&tree, &[]);
        assert!(!reach.reachable_from("root/a").contains("external/only-for-tests"));

        let reach_tests = compute_reach_map_with_tests(&tree, &[]);
        assert!(reach_tests.reachable_from("root/a").contains("external/only-for-tests"));
    }

    #[test]
    fn package_errors_are_propagated() {
        let mut tree = PackageTree::new("root");
        tree.insert_error("root/broken", "parse error");
        let reach = compute_reach_map(&tree, &[]);
        assert_eq!(reach.errors.get("root/broken").map(String::as_str), Some("parse error"));
    }

    #[test]
    fn reach_map_is_invariant_under_declaration_order() {
        let mut forward = PackageTree::new("root");
        forward.insert_package("root/a", Package::new("a", "root/a").with_imports(vec!["root/b".into()]));
        forward.insert_package("root/b", Package::new("b", "root/b").with_imports(vec!["external/x".into()]));

        let mut backward = PackageTree::new("root");
        backward.insert_package("root/b", Package::new("b", "root/b").with_imports(vec!["external/x".into()]));
        backward.insert_package("root/a", Package::new("a", "root/a").with_imports(vec!["root/b".into()]));

        assert_eq!(
            compute_reach_map(&forward, &[]).reachable_from("root/a"),
            compute_reach_map(&backward, &[]).reachable_from("root/a"),
        );
    }
}
