//! Root data (spec §4.7): everything aggregated once at `Prepare` time and
//! held immutable for the duration of a solve.

use crate::manifest::{Manifest, ProjectConstraint};
use crate::package_tree::PackageTree;
use crate::project::ProjectRoot;
use crate::reach::{compute_reach_map, is_stdlib_import, ReachMap};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregates the root manifest, root package tree, and the derived
/// `external_import_list` (spec §4.7).
#[derive(Debug, Clone)]
pub struct RootData {
    pub root: ProjectRoot,
    pub package_tree: PackageTree,
    pub reach_map: ReachMap,
    pub manifest: Manifest,
}

impl RootData {
    pub fn new(root: ProjectRoot, package_tree: PackageTree, manifest: Manifest) -> Self {
        let reach_map = compute_reach_map(&package_tree, &manifest.ignores);
        Self {
            root,
            package_tree,
            reach_map,
            manifest,
        }
    }

    /// The set of external import paths reachable from any non-ignored root
    /// package, plus the explicit requires, with standard-library imports
    /// dropped and ignore rules re-applied. Idempotent, sorted (spec §4.7).
    pub fn external_import_list(&self) -> BTreeSet<String> {
        let mut set: BTreeSet<String> = self.reach_map.all_external();
        for req in &self.manifest.requires {
            if !is_stdlib_import(req) && !self.is_ignored(req) {
                set.insert(req.clone());
            }
        }
        // Re-apply ignores: all_external() already filtered at computation
        // time, but requires might reintroduce something ignored, so filter
        // once more defensively.
        set.retain(|p| !self.is_ignored(p));
        set
    }

    fn is_ignored(&self, import_path: &str) -> bool {
        self.manifest.ignores.iter().any(|pat| {
            match pat.as_str().strip_suffix("/*") {
                Some(prefix) => import_path == prefix || import_path.starts_with(&format!("{prefix}/")),
                None => import_path == pat.as_str(),
            }
        })
    }

    /// The canonical subset of constraints that actually participate in the
    /// solve for this root (spec §4.7 steps 1-6).
    pub fn applicable_constraints(&self) -> BTreeMap<ProjectRoot, ProjectConstraint> {
        let mut constraints = self.manifest.constraints.clone();

        // Step 2: upsert overrides.
        for (root, over) in &self.manifest.overrides {
            match constraints.get_mut(root) {
                Some(existing) => {
                    existing.constraint = over.constraint.clone();
                    if over.source.is_some() {
                        existing.source = over.source.clone();
                    }
                }
                None => {
                    constraints.insert(root.clone(), over.clone());
                }
            }
        }

        // Step 3: required imports with no constraint get `any`.
        let imports = self.external_import_list();
        for import in &imports {
            let root = ProjectRoot::new(import.clone());
            constraints
                .entry(root)
                .or_insert_with(|| ProjectConstraint::new(depsolve_version::Constraint::any()));
        }
        for req in &self.manifest.requires {
            let root = ProjectRoot::new(req.clone());
            constraints
                .entry(root)
                .or_insert_with(|| ProjectConstraint::new(depsolve_version::Constraint::any()));
        }

        // Step 4: drop constraints unreachable from the import set and not required.
        let reachable_or_required: BTreeSet<String> = imports
            .iter()
            .cloned()
            .chain(self.manifest.requires.iter().cloned())
            .collect();
        constraints.retain(|root, _| reachable_or_required.contains(root.as_str()));

        // Step 5: drop ignored projects.
        constraints.retain(|root, _| !self.is_ignored(root.as_str()));

        // Step 6: BTreeMap iteration is already sorted by key.
        constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ProjectConstraint;
    use crate::package_tree::Package;
    use depsolve_version::Constraint;

    fn tree_with(imports: Vec<&str>) -> PackageTree {
        let mut tree = PackageTree::new("root");
        tree.insert_package(
            "root",
            Package::new("root", "root").with_imports(imports.into_iter().map(String::from).collect()),
        );
        tree
    }

    #[test]
    fn applicable_constraints_adds_any_for_unconstrained_reachable_import() {
        let tree = tree_with(vec!["a/b"]);
        let root = RootData::new(ProjectRoot::new("root"), tree, Manifest::new());
        let applicable = root.applicable_constraints();
        assert!(applicable.contains_key(&ProjectRoot::new("a/b")));
        assert!(applicable[&ProjectRoot::new("a/b")].constraint.is_any());
    }

    #[test]
    fn applicable_constraints_drops_unreachable_declared_constraint() {
        let tree = tree_with(vec!["a/b"]);
        let manifest = Manifest::new()
            .with_constraint(ProjectRoot::new("unrelated/x"), ProjectConstraint::new(Constraint::any()));
        let root = RootData::new(ProjectRoot::new("root"), tree, manifest);
        let applicable = root.applicable_constraints();
        assert!(!applicable.contains_key(&ProjectRoot::new("unrelated/x")));
    }

    #[test]
    fn overrides_replace_declared_constraint_and_source() {
        let tree = tree_with(vec!["a/b"]);
        let manifest = Manifest::new()
            .with_constraint(
                ProjectRoot::new("a/b"),
                ProjectConstraint::new(Constraint::parse_range(">=1.0.0").unwrap()),
            )
            .with_override(
                ProjectRoot::new("a/b"),
                ProjectConstraint::new(Constraint::parse_range(">=2.0.0").unwrap()),
            );
        let root = RootData::new(ProjectRoot::new("root"), tree, manifest);
        let applicable = root.applicable_constraints();
        assert_eq!(
            applicable[&ProjectRoot::new("a/b")].constraint,
            Constraint::parse_range(">=2.0.0").unwrap()
        );
    }

    #[test]
    fn requires_without_a_constraint_gets_any_even_if_unreachable() {
        let tree = tree_with(vec![]);
        let manifest = Manifest::new().with_require("forced/x");
        let root = RootData::new(ProjectRoot::new("root"), tree, manifest);
        let applicable = root.applicable_constraints();
        assert!(applicable.contains_key(&ProjectRoot::new("forced/x")));
    }

    #[test]
    fn ignored_projects_are_dropped_even_if_reachable() {
        let tree = tree_with(vec!["blocked/y"]);
        let manifest = Manifest::new().with_ignore("blocked/y");
        let root = RootData::new(ProjectRoot::new("root"), tree, manifest);
        let applicable = root.applicable_constraints();
        assert!(!applicable.contains_key(&ProjectRoot::new("blocked/y")));
    }

    #[test]
    fn external_import_list_is_idempotent_and_sorted() {
        let tree = tree_with(vec!["z/last", "a/first"]);
        let root = RootData::new(ProjectRoot::new("root"), tree, Manifest::new());
        let list: Vec<String> = root.external_import_list().into_iter().collect();
        assert_eq!(list, vec!["a/first".to_string(), "z/last".to_string()]);
    }
}
