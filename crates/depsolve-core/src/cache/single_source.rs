//! The `SingleSourceCache` trait (spec §4.3): a per-project associative
//! store keyed primarily by revision, with manifest extraction additionally
//! keyed by analyzer identity (since manifest/lock extraction is
//! analyzer-specific).

use crate::lock::Lock;
use crate::manifest::Manifest;
use crate::package_tree::PackageTree;
use depsolve_version::{PairedVersion, Revision, UnpairedVersion};

/// `(analyzer name, analyzer version)` — part of the cache key for
/// manifest/lock extraction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnalyzerKey {
    pub name: String,
    pub version: u32,
}

impl AnalyzerKey {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self { name: name.into(), version }
    }
}

/// Per-project memoisation of version lists, manifests, and package trees.
///
/// Implementations may be in-memory only, on-disk only, or a two-tier
/// combination; correctness of the solver must not depend on persistence —
/// a cache miss is always answered by asking the gateway, never treated as
/// an error.
pub trait SingleSourceCache: Send + Sync {
    fn set_manifest_and_lock(&self, revision: &Revision, analyzer: &AnalyzerKey, manifest: Manifest, lock: Option<Lock>);
    fn get_manifest_and_lock(&self, revision: &Revision, analyzer: &AnalyzerKey) -> Option<(Manifest, Option<Lock>)>;

    fn set_package_tree(&self, revision: &Revision, tree: PackageTree);
    fn get_package_tree(&self, revision: &Revision) -> Option<PackageTree>;

    fn set_version_map(&self, versions: Vec<PairedVersion>);
    fn get_all_versions(&self) -> Vec<PairedVersion>;
    fn get_version_by_revision(&self, revision: &Revision) -> Vec<PairedVersion>;
    fn get_version_by_unpaired(&self, unpaired: &UnpairedVersion) -> Option<PairedVersion>;

    fn mark_revision_exists(&self, revision: &Revision);
    fn revision_exists(&self, revision: &Revision) -> bool;
}
