//! `Prepare`: the public entry point that turns one project's manifest, its
//! analyzed package tree, and (optionally) a previous lock into a ready
//! [`Solver`] (spec §6.4). Everything here runs before the first gateway
//! call — it's where change-set requests get validated against the
//! previous lock, and where a root-level case conflict between two import
//! paths is caught before the search ever starts.

use crate::config::SolverConfig;
use crate::contract::{Deducer, ProjectAnalyzer};
use crate::coordinator::{SourceCoordinator, SourceFactory};
use crate::error::PrepareError;
use crate::lock::Lock;
use crate::manifest::Manifest;
use crate::package_tree::PackageTree;
use crate::project::{fold_case, ProjectIdentifier, ProjectRoot};
use crate::provider::CoordinatorProvider;
use crate::root::RootData;
use crate::solver::Solver;
use depsolve_version::Version;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything `Prepare` needs: the root project's identity, its analyzed
/// manifest and package tree, an optional previous lock to prefer versions
/// from, and the change-set/search-direction hints a caller (e.g. a CLI's
/// `--upgrade`/`--downgrade`/`--change` flags) supplies.
pub struct SolveParameters {
    pub root: ProjectRoot,
    pub root_package_tree: PackageTree,
    pub root_manifest: Manifest,
    pub previous_lock: Option<Lock>,
    /// Project-roots the caller explicitly wants re-resolved, ignoring any
    /// preferred version from `previous_lock`. Every entry must already be
    /// present in `previous_lock`, or `Prepare` rejects the request (spec
    /// §4.9 "Requests to change a project not present in the provided lock
    /// are rejected at Prepare time").
    pub to_change: Vec<ProjectRoot>,
    /// Disable preferred versions entirely, as if every project were in
    /// `to_change`.
    pub change_all: bool,
    pub downgrade: bool,
}

impl SolveParameters {
    pub fn new(root: ProjectRoot, root_package_tree: PackageTree, root_manifest: Manifest) -> Self {
        Self {
            root,
            root_package_tree,
            root_manifest,
            previous_lock: None,
            to_change: Vec::new(),
            change_all: false,
            downgrade: false,
        }
    }
}

/// Build the `preferred` map a [`Solver`] search consults before falling
/// back to its ordinary version queue: every project in the previous lock,
/// minus whatever `to_change`/`change_all` disabled.
fn build_preferred_map(previous_lock: &Option<Lock>, change_all: bool, to_change: &[ProjectRoot]) -> HashMap<ProjectRoot, Version> {
    let mut preferred = HashMap::new();
    if change_all {
        return preferred;
    }
    let Some(lock) = previous_lock else {
        return preferred;
    };
    for locked in &lock.projects {
        if to_change.contains(&locked.project.root) {
            continue;
        }
        preferred.insert(locked.project.root.clone(), locked.version());
    }
    preferred
}

fn check_to_change_present_in_lock(params: &SolveParameters) -> Result<(), PrepareError> {
    if params.to_change.is_empty() {
        return Ok(());
    }
    let lock = params.previous_lock.as_ref();
    for root in &params.to_change {
        let present = lock.and_then(|l| l.project(root)).is_some();
        if !present {
            return Err(PrepareError::NoPreviousLock {
                project: ProjectIdentifier::new(root.clone(), None),
            });
        }
    }
    Ok(())
}

fn check_root_package_tree(tree: &PackageTree) -> Result<(), PrepareError> {
    if let Some((path, reason)) = tree.errors().first() {
        return Err(PrepareError::RootPackageTreeError {
            package: path.to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(())
}

/// A root-level import conflicting only by letter case with another
/// root-level import is ambiguous before the search even begins — catch it
/// here rather than letting it surface mid-search as a `WrongCase`/
/// `CaseMismatch` error deep in the backtracking loop.
fn check_no_case_conflicts(root_data: &RootData) -> Result<(), PrepareError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for import in root_data.external_import_list() {
        let fold = fold_case(&import);
        match seen.get(&fold) {
            Some(existing) if existing != &import => {
                return Err(PrepareError::CaseConflict { a: existing.clone(), b: import });
            }
            _ => {
                seen.insert(fold, import);
            }
        }
    }
    Ok(())
}

/// Validate `params` and build a [`Solver`] ready to run, wired to fetch
/// versions/manifests through `coordinator` via `analyzer`.
pub fn prepare<D, F, A>(
    params: SolveParameters,
    coordinator: Arc<SourceCoordinator<D, F>>,
    analyzer: Arc<A>,
) -> Result<Solver<CoordinatorProvider<D, F, A>>, PrepareError>
where
    D: Deducer + Send + Sync,
    F: SourceFactory + Send + Sync,
    A: ProjectAnalyzer + Send + Sync,
{
    check_root_package_tree(&params.root_package_tree)?;
    check_to_change_present_in_lock(&params)?;

    let root_data = RootData::new(params.root, params.root_package_tree, params.root_manifest);
    check_no_case_conflicts(&root_data)?;

    let preferred = build_preferred_map(&params.previous_lock, params.change_all, &params.to_change);
    let config = SolverConfig::new().with_downgrade(params.downgrade);
    let info = analyzer.info();
    let provider = CoordinatorProvider::new(coordinator, analyzer);

    Ok(Solver::new(root_data, provider, config, preferred, info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::AnalyzerInfo;
    use crate::package_tree::Package;
    use crate::project::Source as SourceLocator;
    use async_trait::async_trait;
    use depsolve_version::Revision;
    use std::path::Path;

    struct NullDeducer;
    impl Deducer for NullDeducer {
        fn deduce_root_path(&self, import_path: &str) -> Option<(ProjectRoot, Vec<SourceLocator>)> {
            Some((ProjectRoot::new(import_path), vec![SourceLocator::new("https://example.org")]))
        }
    }

    struct NullFactory;
    impl SourceFactory for NullFactory {
        fn build(&self, _project: &ProjectIdentifier) -> Arc<dyn crate::contract::Source> {
            unreachable!("these tests never drive the search far enough to need a real source")
        }
    }

    struct NullAnalyzer;
    #[async_trait]
    impl ProjectAnalyzer for NullAnalyzer {
        async fn derive_manifest_and_lock(&self, _dir: &Path, _root: &ProjectRoot) -> anyhow::Result<(Manifest, Option<Lock>)> {
            Ok((Manifest::new(), None))
        }
        fn info(&self) -> AnalyzerInfo {
            AnalyzerInfo { name: "null-analyzer".into(), version: 1 }
        }
    }

    fn coordinator() -> Arc<SourceCoordinator<NullDeducer, NullFactory>> {
        Arc::new(SourceCoordinator::new(NullDeducer, NullFactory, Arc::new(crate::supervisor::Supervisor::new())))
    }

    #[test]
    fn rejects_a_root_package_tree_error() {
        let mut tree = PackageTree::new("root");
        tree.insert_error("root/broken", "parse failure");
        let params = SolveParameters::new(ProjectRoot::new("root"), tree, Manifest::new());
        let err = prepare(params, coordinator(), Arc::new(NullAnalyzer)).unwrap_err();
        assert!(matches!(err, PrepareError::RootPackageTreeError { .. }));
    }

    #[test]
    fn rejects_a_change_request_for_a_project_absent_from_the_previous_lock() {
        let tree = PackageTree::new("root");
        let mut params = SolveParameters::new(ProjectRoot::new("root"), tree, Manifest::new());
        params.to_change = vec![ProjectRoot::new("never/locked")];
        let err = prepare(params, coordinator(), Arc::new(NullAnalyzer)).unwrap_err();
        assert!(matches!(err, PrepareError::NoPreviousLock { .. }));
    }

    #[test]
    fn rejects_root_imports_differing_only_in_case() {
        let mut tree = PackageTree::new("root");
        tree.insert_package(
            "root",
            Package::new("root", "root").with_imports(vec!["Example.org/A".into(), "example.org/a".into()]),
        );
        let params = SolveParameters::new(ProjectRoot::new("root"), tree, Manifest::new());
        let err = prepare(params, coordinator(), Arc::new(NullAnalyzer)).unwrap_err();
        assert!(matches!(err, PrepareError::CaseConflict { .. }));
    }

    #[test]
    fn preferred_map_omits_projects_requested_for_change() {
        let locked = crate::lock::LockedProject::new(
            ProjectIdentifier::from_root("example.org/a"),
            None,
            Some(Revision::new("rev1")),
            vec!["example.org/a".into()],
        )
        .unwrap();
        let lock = Lock::new([0u8; 32], vec![locked]);
        let to_change = vec![ProjectRoot::new("example.org/a")];
        let preferred = build_preferred_map(&Some(lock), false, &to_change);
        assert!(!preferred.contains_key(&ProjectRoot::new("example.org/a")));
    }

    #[test]
    fn change_all_disables_every_preferred_version() {
        let locked = crate::lock::LockedProject::new(
            ProjectIdentifier::from_root("example.org/a"),
            None,
            Some(Revision::new("rev1")),
            vec!["example.org/a".into()],
        )
        .unwrap();
        let lock = Lock::new([0u8; 32], vec![locked]);
        let preferred = build_preferred_map(&Some(lock), true, &[]);
        assert!(preferred.is_empty());
    }
}
