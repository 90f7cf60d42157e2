//! Two-tier `SingleSourceCache`: an in-memory cache backed by a disk-persisted
//! version map, per spec §4.3 ("in-memory only, on-disk only, or a two-tier
//! combination... not required to be persistent; correctness must not
//! depend on persistence").
//!
//! Manifests and package trees stay memory-resident for the life of the
//! gateway — they're large, analyzer-specific, and re-derived cheaply from
//! a synced local checkout. The version list is the one thing worth
//! surviving a process restart (it requires a network round-trip to
//! upstream), so it's the only thing persisted to disk here, written with
//! an epoch alongside it; entries older than the invalidation window are
//! discarded at read time rather than trusted.

use crate::cache::memory::MemorySingleSourceCache;
use crate::cache::single_source::{AnalyzerKey, SingleSourceCache};
use crate::lock::Lock;
use crate::manifest::Manifest;
use crate::package_tree::PackageTree;
use depsolve_cache::{is_fresh, now_epoch_secs, read_json_file, write_json_file, DEFAULT_EPOCH_WINDOW_SECS};
use depsolve_version::{PairedVersion, Revision, UnpairedVersion};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, trace, warn};

#[derive(Debug, Serialize, Deserialize)]
struct VersionMapEntry {
    epoch: u64,
    versions: Vec<PairedVersion>,
}

pub struct DiskSingleSourceCache {
    memory: MemorySingleSourceCache,
    version_map_path: PathBuf,
    epoch_window_secs: u64,
}

impl DiskSingleSourceCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_epoch_window(cache_dir, DEFAULT_EPOCH_WINDOW_SECS)
    }

    pub fn with_epoch_window(cache_dir: impl Into<PathBuf>, epoch_window_secs: u64) -> Self {
        let version_map_path = cache_dir.into().join("versions.json");
        let memory = MemorySingleSourceCache::new();
        if let Some(entry) = Self::load_if_fresh(&version_map_path, epoch_window_secs) {
            debug!(path = %version_map_path.display(), count = entry.versions.len(), "loaded persisted version map");
            memory.set_version_map(entry.versions);
        }
        Self {
            memory,
            version_map_path,
            epoch_window_secs,
        }
    }

    fn load_if_fresh(path: &PathBuf, window: u64) -> Option<VersionMapEntry> {
        let entry: VersionMapEntry = read_json_file(path).ok()?;
        if is_fresh(entry.epoch, now_epoch_secs(), window) {
            Some(entry)
        } else {
            trace!(path = %path.display(), "disk cache entry is stale, ignoring");
            None
        }
    }

    fn persist(&self, versions: &[PairedVersion]) {
        let entry = VersionMapEntry {
            epoch: now_epoch_secs(),
            versions: versions.to_vec(),
        };
        if let Err(err) = write_json_file(&self.version_map_path, &entry) {
            warn!(path = %self.version_map_path.display(), %err, "failed to persist version map to disk");
        }
    }
}

impl SingleSourceCache for DiskSingleSourceCache {
    fn set_manifest_and_lock(&self, revision: &Revision, analyzer: &AnalyzerKey, manifest: Manifest, lock: Option<Lock>) {
        self.memory.set_manifest_and_lock(revision, analyzer, manifest, lock);
    }

    fn get_manifest_and_lock(&self, revision: &Revision, analyzer: &AnalyzerKey) -> Option<(Manifest, Option<Lock>)> {
        self.memory.get_manifest_and_lock(revision, analyzer)
    }

    fn set_package_tree(&self, revision: &Revision, tree: PackageTree) {
        self.memory.set_package_tree(revision, tree);
    }

    fn get_package_tree(&self, revision: &Revision) -> Option<PackageTree> {
        self.memory.get_package_tree(revision)
    }

    fn set_version_map(&self, versions: Vec<PairedVersion>) {
        self.persist(&versions);
        self.memory.set_version_map(versions);
    }

    fn get_all_versions(&self) -> Vec<PairedVersion> {
        self.memory.get_all_versions()
    }

    fn get_version_by_revision(&self, revision: &Revision) -> Vec<PairedVersion> {
        self.memory.get_version_by_revision(revision)
    }

    fn get_version_by_unpaired(&self, unpaired: &UnpairedVersion) -> Option<PairedVersion> {
        self.memory.get_version_by_unpaired(unpaired)
    }

    fn mark_revision_exists(&self, revision: &Revision) {
        self.memory.mark_revision_exists(revision);
    }

    fn revision_exists(&self, revision: &Revision) -> bool {
        self.memory.revision_exists(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depsolve_version::Version;
    use tempfile::tempdir;

    #[test]
    fn version_map_survives_a_reopen() {
        let dir = tempdir().unwrap();
        let rev = Revision::new("rev1");
        let v = Version::plain("v1").pair(rev.clone());

        {
            let cache = DiskSingleSourceCache::new(dir.path());
            cache.set_version_map(vec![v.clone()]);
        }

        let reopened = DiskSingleSourceCache::new(dir.path());
        assert_eq!(reopened.get_all_versions(), vec![v]);
    }

    #[test]
    fn stale_entries_are_not_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions.json");
        let stale = VersionMapEntry { epoch: 1, versions: vec![] };
        write_json_file(&path, &stale).unwrap();

        let cache = DiskSingleSourceCache::with_epoch_window(dir.path(), 10);
        assert!(cache.get_all_versions().is_empty());
    }
}
