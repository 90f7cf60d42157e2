//! In-memory `SingleSourceCache`: the default, always-available
//! implementation. Lives for the lifetime of the owning gateway.

use crate::cache::single_source::{AnalyzerKey, SingleSourceCache};
use crate::lock::Lock;
use crate::manifest::Manifest;
use crate::package_tree::PackageTree;
use depsolve_version::{PairedVersion, Revision, UnpairedVersion};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemorySingleSourceCache {
    manifests: Mutex<HashMap<(Revision, AnalyzerKey), (Manifest, Option<Lock>)>>,
    trees: Mutex<HashMap<Revision, PackageTree>>,
    versions: Mutex<Vec<PairedVersion>>,
    existing_revisions: Mutex<std::collections::HashSet<Revision>>,
}

impl MemorySingleSourceCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SingleSourceCache for MemorySingleSourceCache {
    fn set_manifest_and_lock(&self, revision: &Revision, analyzer: &AnalyzerKey, manifest: Manifest, lock: Option<Lock>) {
        self.manifests
            .lock()
            .unwrap()
            .insert((revision.clone(), analyzer.clone()), (manifest, lock));
    }

    fn get_manifest_and_lock(&self, revision: &Revision, analyzer: &AnalyzerKey) -> Option<(Manifest, Option<Lock>)> {
        self.manifests.lock().unwrap().get(&(revision.clone(), analyzer.clone())).cloned()
    }

    fn set_package_tree(&self, revision: &Revision, tree: PackageTree) {
        self.trees.lock().unwrap().insert(revision.clone(), tree);
    }

    fn get_package_tree(&self, revision: &Revision) -> Option<PackageTree> {
        self.trees.lock().unwrap().get(revision).cloned()
    }

    fn set_version_map(&self, versions: Vec<PairedVersion>) {
        *self.versions.lock().unwrap() = versions;
    }

    fn get_all_versions(&self) -> Vec<PairedVersion> {
        self.versions.lock().unwrap().clone()
    }

    fn get_version_by_revision(&self, revision: &Revision) -> Vec<PairedVersion> {
        self.versions
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.revision() == revision)
            .cloned()
            .collect()
    }

    fn get_version_by_unpaired(&self, unpaired: &UnpairedVersion) -> Option<PairedVersion> {
        self.versions.lock().unwrap().iter().find(|v| v.unpair() == unpaired).cloned()
    }

    fn mark_revision_exists(&self, revision: &Revision) {
        self.existing_revisions.lock().unwrap().insert(revision.clone());
    }

    fn revision_exists(&self, revision: &Revision) -> bool {
        self.existing_revisions.lock().unwrap().contains(revision)
    }
}
