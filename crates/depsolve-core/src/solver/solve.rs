//! The bimodal backtracking search itself (spec §4.9).
//!
//! The search alternates between two modes against the same `unselected`
//! queue: picking a version for a project not yet selected, and, once an
//! atom is selected, walking the packages it was asked to provide to
//! discover further external imports. Backtracking never touches the
//! `selected` vector with anything but `truncate` — every popped atom's
//! contribution to `unselected` was snapshotted in a parallel `frames`
//! stack when it was pushed, so undoing a decision is restoring that
//! snapshot plus truncating both vectors to the same length.
//!
//! A version, once excluded from a project's queue by a failed attempt, is
//! never reconsidered for the rest of this solve (failure caching) — this
//! is what keeps conflict-directed backjumping from re-deriving the same
//! dead end on every retry.

use crate::digest::{compute_input_digest, AnalyzerInfo};
use crate::error::{NoVersionError, SolverError, VersionRejection};
use crate::manifest::{Manifest, ProjectConstraint};
use crate::package_tree::{PackageOrError, PackageTree};
use crate::project::{fold_case, ProjectIdentifier, ProjectRoot, Source};
use crate::reach::{is_stdlib_import, IgnorePattern};
use crate::root::RootData;
use crate::solver::atom::{Atom, BimodalIdentifier, SelectedAtom};
use crate::solver::failure::FailureMap;
use crate::solver::queue::VersionQueue;
use crate::solution::Solution;
use async_trait::async_trait;
use depsolve_version::{Constraint, PairedVersion, Version};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// What the solver needs from the gateway/coordinator layer, abstracted so
/// the search itself stays free of VCS and caching concerns. In production
/// this wraps a [`crate::coordinator::SourceCoordinator`]; tests implement
/// it directly against an in-memory fixture.
#[async_trait]
pub trait ProjectProvider: Send + Sync {
    /// Map an import path to the project that owns it and the package
    /// sub-path within that project (spec §6.3, composed with the
    /// coordinator's gateway lookup).
    async fn resolve_import(&self, import_path: &str) -> Result<(ProjectIdentifier, String), SolverError>;

    /// Every version the project's source currently offers.
    async fn candidate_versions(&self, project: &ProjectIdentifier) -> Result<Vec<PairedVersion>, SolverError>;

    /// The manifest and package tree as of one specific version.
    async fn manifest_and_tree(&self, project: &ProjectIdentifier, version: &Version) -> Result<(Manifest, PackageTree), SolverError>;
}

struct SelectedEntry {
    atom: SelectedAtom,
    manifest: Manifest,
    tree: PackageTree,
}

type Frame = VecDeque<BimodalIdentifier>;

/// Drives one solve attempt to completion: immutable root/provider/config
/// inputs, with all mutable search state local to [`Solver::solve`].
pub struct Solver<P: ProjectProvider> {
    root: RootData,
    applicable_constraints: BTreeMap<ProjectRoot, ProjectConstraint>,
    provider: P,
    config: crate::config::SolverConfig,
    preferred: HashMap<ProjectRoot, Version>,
    analyzer: AnalyzerInfo,
    #[cfg(feature = "solver-trace")]
    pub trace: std::sync::Mutex<crate::trace::SolverTrace>,
}

impl<P: ProjectProvider> Solver<P> {
    pub fn new(
        root: RootData,
        provider: P,
        config: crate::config::SolverConfig,
        preferred: HashMap<ProjectRoot, Version>,
        analyzer: AnalyzerInfo,
    ) -> Self {
        let applicable_constraints = root.applicable_constraints();
        Self {
            root,
            applicable_constraints,
            provider,
            config,
            preferred,
            analyzer,
            #[cfg(feature = "solver-trace")]
            trace: std::sync::Mutex::new(crate::trace::SolverTrace::new()),
        }
    }

    /// The SHA-256 fingerprint of every input that would change the
    /// outcome of a solve, independent of running one (spec §4.8).
    pub fn hash_inputs(&self) -> [u8; 32] {
        let ignores: Vec<String> = self.root.manifest.ignores.iter().map(|p| p.as_str().to_string()).collect();
        compute_input_digest(
            &self.applicable_constraints,
            &self.root.manifest.overrides,
            &ignores,
            &self.root.external_import_list(),
            &self.root.manifest.requires,
            &self.analyzer,
        )
    }

    /// An override on `root` wins outright: every dependency's own declared
    /// constraint on that project is ignored rather than intersected in.
    fn effective_constraint(&self, root: &ProjectRoot, selected: &[SelectedEntry]) -> Constraint {
        if let Some(pc) = self.root.manifest.overrides.get(root) {
            return pc.constraint.clone();
        }
        let mut constraint = self
            .applicable_constraints
            .get(root)
            .map(|pc| pc.constraint.clone())
            .unwrap_or_else(Constraint::any);
        for entry in selected {
            if let Some(pc) = entry.manifest.constraints.get(root) {
                constraint = constraint.intersect(&pc.constraint);
            }
        }
        constraint
    }

    /// Does `manifest`'s own constraints conflict with a project already
    /// fixed in `selected`? Used as a forward check before committing to a
    /// candidate version (cheaper than discovering the conflict several
    /// pops later).
    fn forward_conflict(&self, manifest: &Manifest, selected: &[SelectedEntry]) -> Option<String> {
        for (root, pc) in &manifest.constraints {
            if self.root.manifest.overrides.contains_key(root) {
                continue;
            }
            if let Some(entry) = selected.iter().find(|e| &e.atom.atom.project.root == root) {
                if !pc.constraint.matches(&entry.atom.atom.version) {
                    return Some(format!(
                        "requires {root} {} but {} is already selected",
                        pc.constraint,
                        entry.atom.atom.version
                    ));
                }
            }
        }
        None
    }

    #[cfg(feature = "solver-trace")]
    fn trace_attempt(&self, project: &ProjectIdentifier, version: &Version, outcome: crate::trace::TraceOutcome) {
        self.trace.lock().unwrap().record(project.clone(), version.clone(), outcome);
    }

    #[cfg(not(feature = "solver-trace"))]
    fn trace_attempt(&self, _project: &ProjectIdentifier, _version: &Version, _outcome: crate::trace::TraceOutcome) {}

    /// Is `import` contained within the root project's own import root
    /// (spec §4.2's "external means not contained in this project's import
    /// root", applied here to a *dependency's* import that happens to fold
    /// back into the literal project being solved, per spec §8 scenario 4
    /// "cycle via root")? The root is always implicitly present — it's the
    /// thing being solved, not a candidate — so any import path under its
    /// prefix is already satisfied and must never become a new bimodal
    /// identifier, let alone be asked of a deducer.
    fn is_under_solve_root(&self, import: &str) -> bool {
        let prefix = self.root.root.as_str();
        import == prefix || import.starts_with(&format!("{prefix}/"))
    }

    async fn push_import(
        &self,
        import: &str,
        unselected: &mut VecDeque<BimodalIdentifier>,
        known_roots: &mut HashMap<String, (String, bool)>,
        known_sources: &mut HashMap<ProjectRoot, Source>,
        from_root: bool,
    ) -> Result<(), SolverError> {
        if is_stdlib_import(import) || self.is_under_solve_root(import) {
            return Ok(());
        }
        let (project, subpackage) = self.provider.resolve_import(import).await?;
        let fold = fold_case(project.root.as_str());
        match known_roots.get(&fold) {
            Some((spelling, seen_from_root)) if spelling != project.root.as_str() => {
                return Err(if *seen_from_root {
                    SolverError::WrongCase {
                        path: project.root.as_str().to_string(),
                        root: spelling.clone(),
                    }
                } else {
                    SolverError::CaseMismatch {
                        found: project.root.as_str().to_string(),
                        existing: spelling.clone(),
                    }
                });
            }
            _ => {
                known_roots.entry(fold).or_insert_with(|| (project.root.as_str().to_string(), from_root));
            }
        }

        if let Some(source) = &project.source {
            match known_sources.get(&project.root) {
                Some(existing) if existing != source => {
                    return Err(SolverError::SourceMismatch { project: project.clone() });
                }
                _ => {
                    known_sources.insert(project.root.clone(), source.clone());
                }
            }
        }

        if let Some(existing) = unselected.iter_mut().find(|b| b.project == project) {
            existing.merge_packages(std::iter::once(subpackage));
        } else {
            unselected.push_back(BimodalIdentifier::new(project).with_package(subpackage));
        }
        Ok(())
    }

    pub async fn solve(&self) -> Result<Solution, SolverError> {
        let mut selected: Vec<SelectedEntry> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut unselected: VecDeque<BimodalIdentifier> = VecDeque::new();
        let mut queues: HashMap<ProjectRoot, VersionQueue> = HashMap::new();
        let mut failures = FailureMap::new();
        let mut known_roots: HashMap<String, (String, bool)> = HashMap::new();
        let mut known_sources: HashMap<ProjectRoot, Source> = HashMap::new();
        let mut attempts: u32 = 0;

        let root_packages: BTreeSet<String> = self.root.package_tree.package_paths().map(String::from).collect();
        let (_, root_externals) = expand_internal(&self.root.package_tree, &self.root.manifest.ignores, &root_packages)
            .map_err(|problems| SolverError::CheckeeHasProblemPackages {
                project: ProjectIdentifier::new(self.root.root.clone(), None),
                version: Version::plain("root"),
                packages: problems,
            })?;
        let mut seed_externals = root_externals;
        for req in &self.root.manifest.requires {
            if !is_stdlib_import(req) {
                seed_externals.insert(req.clone());
            }
        }
        for import in &seed_externals {
            self.push_import(import, &mut unselected, &mut known_roots, &mut known_sources, true).await?;
        }

        let mut iterations: u64 = 0;
        loop {
            iterations += 1;
            if iterations > 200_000 {
                return Err(SolverError::Other(anyhow::anyhow!("solver exceeded its iteration budget")));
            }

            if unselected.is_empty() {
                break;
            }
            // spec §4.9 step 2: prefer the identifier with the smallest
            // number of candidate versions known so far (fail fast on the
            // most over-constrained project), breaking ties in insertion
            // order — `min_by_key` returns the first of equal minima, and
            // `unselected` is walked front-to-back, so a tie resolves to
            // whichever entry has been waiting longest. A project whose
            // queue hasn't been built yet has nothing "known" at all, which
            // sorts lowest of all until something is actually known about
            // its competitors too.
            let pick_idx = unselected
                .iter()
                .enumerate()
                .min_by_key(|(_, b)| queues.get(&b.project.root).map(|q| q.len_known()))
                .map(|(i, _)| i)
                .expect("unselected is non-empty");
            let bimodal = unselected.remove(pick_idx).expect("pick_idx is in bounds");
            let project = bimodal.project.clone();

            if let Some(idx) = selected.iter().position(|e| e.atom.atom.project == project) {
                let new_packages: BTreeSet<String> =
                    bimodal.packages.difference(&selected[idx].atom.packages).cloned().collect();
                if new_packages.is_empty() {
                    continue;
                }
                let tree = selected[idx].tree.clone();
                let ignores = selected[idx].manifest.ignores.clone();
                match expand_internal(&tree, &ignores, &new_packages) {
                    Ok((required, externals)) => {
                        for p in required {
                            selected[idx].atom.add_package(p);
                        }
                        for ext in &externals {
                            self.push_import(ext, &mut unselected, &mut known_roots, &mut known_sources, false).await?;
                        }
                    }
                    Err(problems) => {
                        return Err(SolverError::DepHasProblemPackages {
                            project: project.clone(),
                            version: selected[idx].atom.atom.version.clone(),
                            packages: problems,
                        });
                    }
                }
                continue;
            }

            let effective = self.effective_constraint(&project.root, &selected);
            if effective.is_none() {
                return Err(SolverError::DisjointConstraint { project });
            }

            if !queues.contains_key(&project.root) {
                let candidates = self.provider.candidate_versions(&project).await?;
                let versions: Vec<Version> = candidates.into_iter().map(Version::Paired).collect();
                let preferred = self.preferred.get(&project.root).cloned();
                let queue = VersionQueue::build(versions, &effective, self.config.downgrade, preferred.as_ref());
                queues.insert(project.root.clone(), queue);
            } else {
                // The effective constraint can have relaxed since this
                // project's queue was last built or filtered — e.g. a
                // backjump just undid the selection that imposed the
                // tightest constraint seen so far. Re-derive `remaining()`
                // against the live constraint rather than reusing a queue
                // permanently narrowed at an earlier, tighter moment.
                queues.get_mut(&project.root).expect("just checked present").refilter_if_changed(&effective);
            }

            let queue = queues.get_mut(&project.root).expect("just inserted if absent");
            let candidates: Vec<Version> = queue.remaining().cloned().collect();
            let mut picked = None;
            for candidate in candidates {
                if !effective.matches(&candidate) {
                    queue.exclude(&candidate);
                    let reason = "excluded by a constraint added since this queue was built";
                    self.trace_attempt(&project, &candidate, crate::trace::TraceOutcome::Rejected(reason.to_string()));
                    failures.record(project.clone(), candidate, reason);
                    continue;
                }
                attempts += 1;
                match self.provider.manifest_and_tree(&project, &candidate).await {
                    Ok((manifest, tree)) => {
                        if let Some(reason) = self.forward_conflict(&manifest, &selected) {
                            queue.exclude(&candidate);
                            self.trace_attempt(&project, &candidate, crate::trace::TraceOutcome::Rejected(reason.clone()));
                            failures.record(project.clone(), candidate, reason);
                            continue;
                        }
                        self.trace_attempt(&project, &candidate, crate::trace::TraceOutcome::Selected);
                        picked = Some((candidate, manifest, tree));
                        break;
                    }
                    Err(err) => {
                        queue.exclude(&candidate);
                        self.trace_attempt(&project, &candidate, crate::trace::TraceOutcome::Rejected(err.to_string()));
                        failures.record(project.clone(), candidate, err.to_string());
                    }
                }
            }

            match picked {
                Some((version, manifest, tree)) => {
                    let initial_required: BTreeSet<String> = if bimodal.packages.is_empty() {
                        std::iter::once(project.root.as_str().to_string()).collect()
                    } else {
                        bimodal.packages.clone()
                    };
                    match expand_internal(&tree, &manifest.ignores, &initial_required) {
                        Ok((required, externals)) => {
                            let mut selected_atom = SelectedAtom::new(Atom::new(project.clone(), version.clone()));
                            for p in required {
                                selected_atom.add_package(p);
                            }
                            frames.push(unselected.clone());
                            selected.push(SelectedEntry { atom: selected_atom, manifest, tree });
                            for ext in &externals {
                                self.push_import(ext, &mut unselected, &mut known_roots, &mut known_sources, false).await?;
                            }
                        }
                        Err(problems) => {
                            return Err(SolverError::CheckeeHasProblemPackages { project, version, packages: problems });
                        }
                    }
                }
                None => {
                    let culprit_indices: Vec<usize> = selected
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| e.manifest.constraints.contains_key(&project.root))
                        .map(|(i, _)| i)
                        .collect();

                    if let Some(&idx) = culprit_indices.last() {
                        let culprit_project = selected[idx].atom.atom.project.clone();
                        let culprit_version = selected[idx].atom.atom.version.clone();
                        let culprit_packages = selected[idx].atom.packages.clone();
                        if let Some(q) = queues.get_mut(&culprit_project.root) {
                            q.exclude(&culprit_version);
                        }
                        self.trace_attempt(&culprit_project, &culprit_version, crate::trace::TraceOutcome::BackjumpedPast);
                        unselected = frames[idx].clone();
                        selected.truncate(idx);
                        frames.truncate(idx);
                        // `frames[idx]` is `unselected` as it stood right
                        // after the culprit was popped off it but before its
                        // own externals were pushed — it never contained the
                        // culprit itself. Without pushing it back here the
                        // culprit ends up in neither `selected` nor
                        // `unselected` and is never retried with its
                        // just-excluded version removed (spec §4.9
                        // backjumping requires re-trying "the offending
                        // project").
                        let mut culprit_bimodal = BimodalIdentifier::new(culprit_project);
                        culprit_bimodal.merge_packages(culprit_packages);
                        unselected.push_front(culprit_bimodal);
                        continue;
                    }

                    let attempts_list: Vec<VersionRejection> = failures
                        .attempts_for(&project)
                        .into_iter()
                        .map(|(version, reason)| VersionRejection { version, reason })
                        .collect();
                    return Err(SolverError::NoVersion(NoVersionError {
                        project,
                        attempts: attempts_list,
                        culprits: Vec::new(),
                    }));
                }
            }
        }

        self.build_lock(&selected, attempts)
    }

    fn build_lock(&self, selected: &[SelectedEntry], attempts: u32) -> Result<Solution, SolverError> {
        let mut projects = Vec::with_capacity(selected.len());
        for entry in selected {
            let packages: Vec<String> = entry.atom.packages.iter().cloned().collect();
            let locked = crate::lock::LockedProject::new(
                entry.atom.atom.project.clone(),
                Some(entry.atom.atom.version.clone()),
                None,
                packages,
            )
            .map_err(|e| SolverError::Other(anyhow::anyhow!(e.to_string())))?;
            projects.push(locked);
        }
        let lock = crate::lock::Lock::new(self.hash_inputs(), projects);
        Ok(Solution { lock, attempts })
    }
}

fn is_ignored(import_path: &str, ignores: &[IgnorePattern]) -> bool {
    ignores.iter().any(|pat| match pat.as_str().strip_suffix("/*") {
        Some(prefix) => import_path == prefix || import_path.starts_with(&format!("{prefix}/")),
        None => import_path == pat.as_str(),
    })
}

/// Walk the internal-import closure of `seeds` within one project's tree,
/// returning every package reached (including the seeds) and every external
/// import surfaced along the way. A seed (or anything reached from it) that
/// errored or doesn't exist in the tree is collected into the `Err` list
/// rather than aborting the walk early, so a caller can report every
/// problem package at once.
fn expand_internal(
    tree: &PackageTree,
    ignores: &[IgnorePattern],
    seeds: &BTreeSet<String>,
) -> Result<(BTreeSet<String>, BTreeSet<String>), Vec<String>> {
    let mut required = BTreeSet::new();
    let mut externals = BTreeSet::new();
    let mut problems = Vec::new();
    let mut stack: Vec<String> = seeds.iter().cloned().collect();

    while let Some(pkg_path) = stack.pop() {
        if !required.insert(pkg_path.clone()) {
            continue;
        }
        match tree.packages.get(&pkg_path) {
            Some(PackageOrError::Package(pkg)) => {
                for imp in &pkg.imports {
                    if is_stdlib_import(imp) || is_ignored(imp, ignores) {
                        continue;
                    }
                    if tree.packages.contains_key(imp) {
                        stack.push(imp.clone());
                    } else {
                        externals.insert(imp.clone());
                    }
                }
            }
            Some(PackageOrError::Error(_)) | None => {
                problems.push(pkg_path);
            }
        }
    }

    if problems.is_empty() {
        Ok((required, externals))
    } else {
        problems.sort();
        problems.dedup();
        Err(problems)
    }
}
