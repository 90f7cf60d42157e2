//! Source gateway (spec §4.4): serialises every operation on one source
//! behind a per-gateway mutex, advances a monotonic state machine, and owns
//! that project's single-source cache.

use crate::cache::{AnalyzerKey, MemorySingleSourceCache, SingleSourceCache};
use crate::contract::{ProjectAnalyzer, Source};
use crate::digest::AnalyzerInfo;
use crate::error::GatewayError;
use crate::lock::Lock;
use crate::manifest::Manifest;
use crate::package_tree::PackageTree;
use crate::project::{ProjectIdentifier, ProjectRoot, Source as SourceLocator};
use crate::supervisor::{CallType, Supervisor};
use depsolve_version::{PairedVersion, Revision};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

bitflags::bitflags! {
    /// Monotonically increasing state bits (spec §3 "Source state",
    /// §4.4). A bit, once set, is never cleared for the gateway's lifetime.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SrcState: u8 {
        const IS_SET_UP = 0b0000_0001;
        const EXISTS_UPSTREAM = 0b0000_0010;
        const EXISTS_LOCALLY = 0b0000_0100;
        const HAS_LATEST_VERSION_LIST = 0b0000_1000;
        const HAS_LATEST_LOCALLY = 0b0001_0000;
    }
}

/// A candidate list of URLs/schemes to try during setup, in order.
#[derive(Debug, Clone)]
pub struct MaybeSource {
    pub candidates: Vec<SourceLocator>,
}

struct GatewayInner {
    state: SrcState,
    resolved_url: Option<String>,
}

/// Serialises all operations on one project's source.
pub struct SourceGateway {
    pub project: ProjectIdentifier,
    maybe_source: MaybeSource,
    source: Arc<dyn Source>,
    cache: Arc<dyn SingleSourceCache>,
    inner: Mutex<GatewayInner>,
    supervisor: Arc<Supervisor>,
}

impl SourceGateway {
    pub fn new(project: ProjectIdentifier, maybe_source: MaybeSource, source: Arc<dyn Source>, supervisor: Arc<Supervisor>) -> Self {
        Self {
            project,
            maybe_source,
            source,
            cache: Arc::new(MemorySingleSourceCache::new()),
            inner: Mutex::new(GatewayInner { state: SrcState::empty(), resolved_url: None }),
            supervisor,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn SingleSourceCache>) -> Self {
        self.cache = cache;
        self
    }

    pub async fn source_state(&self) -> SrcState {
        self.inner.lock().await.state
    }

    /// Advance the state machine to ensure every bit in `wanted` is set.
    /// Walks bits in the fixed order from spec §4.4's table; on any failure
    /// returns the bit at which it failed, without advancing past it.
    pub async fn require(&self, wanted: SrcState) -> Result<(), GatewayError> {
        let mut guard = self.inner.lock().await;

        if wanted.contains(SrcState::IS_SET_UP) && !guard.state.contains(SrcState::IS_SET_UP) {
            self.do_setup(&mut guard).await?;
        }
        if wanted.contains(SrcState::EXISTS_UPSTREAM) && !guard.state.contains(SrcState::EXISTS_UPSTREAM) {
            self.do_exists_upstream(&mut guard).await?;
        }
        if wanted.contains(SrcState::EXISTS_LOCALLY) && !guard.state.contains(SrcState::EXISTS_LOCALLY) {
            self.do_exists_locally(&mut guard).await?;
        }
        if wanted.contains(SrcState::HAS_LATEST_VERSION_LIST) && !guard.state.contains(SrcState::HAS_LATEST_VERSION_LIST) {
            self.do_list_versions(&mut guard).await?;
        }
        if wanted.contains(SrcState::HAS_LATEST_LOCALLY) && !guard.state.contains(SrcState::HAS_LATEST_LOCALLY) {
            self.do_update_local(&mut guard).await?;
        }
        Ok(())
    }

    async fn do_setup(&self, guard: &mut GatewayInner) -> Result<(), GatewayError> {
        if self.maybe_source.candidates.is_empty() {
            return Err(GatewayError::SetupFailed {
                project: self.project.clone(),
                reason: "no candidate sources to probe".into(),
            });
        }
        // In a real VCS layer, each candidate would be probed in turn; the
        // core only needs the winning URL recorded.
        let winner = self.maybe_source.candidates[0].clone();
        guard.resolved_url = Some(winner.as_str().to_string());
        guard.state.insert(SrcState::IS_SET_UP);
        debug!(project = %self.project, url = %winner, "source gateway set up");
        Ok(())
    }

    async fn do_exists_upstream(&self, guard: &mut GatewayInner) -> Result<(), GatewayError> {
        let exists = self
            .supervisor
            .do_call(self.project.normalized_source(), CallType::Ping, || self.source.exists_upstream())
            .await
            .map_err(|_| GatewayError::Timeout { project: self.project.clone() })?
            .map_err(GatewayError::Other)?;
        if !exists {
            return Err(GatewayError::NotUpstream { project: self.project.clone() });
        }
        guard.state.insert(SrcState::EXISTS_UPSTREAM);
        Ok(())
    }

    async fn do_exists_locally(&self, guard: &mut GatewayInner) -> Result<(), GatewayError> {
        let exists = self.source.exists_locally().await.map_err(GatewayError::Other)?;
        if !exists {
            self.source.init_local().await.map_err(GatewayError::Other)?;
            guard.state.insert(SrcState::HAS_LATEST_LOCALLY);
        }
        guard.state.insert(SrcState::EXISTS_LOCALLY);
        Ok(())
    }

    async fn do_list_versions(&self, guard: &mut GatewayInner) -> Result<(), GatewayError> {
        let versions = self
            .supervisor
            .do_call(self.project.normalized_source(), CallType::ListVersions, || self.source.list_versions())
            .await
            .map_err(|_| GatewayError::Timeout { project: self.project.clone() })?
            .map_err(GatewayError::Other)?;
        for v in &versions {
            self.cache.mark_revision_exists(v.revision());
        }
        self.cache.set_version_map(versions);
        guard.state.insert(SrcState::HAS_LATEST_VERSION_LIST);
        Ok(())
    }

    async fn do_update_local(&self, guard: &mut GatewayInner) -> Result<(), GatewayError> {
        self.source.update_local().await.map_err(GatewayError::Other)?;
        guard.state.insert(SrcState::HAS_LATEST_LOCALLY);
        Ok(())
    }

    /// All known versions (cache-first; refreshes from upstream once if
    /// empty).
    pub async fn list_versions(&self) -> Result<Vec<PairedVersion>, GatewayError> {
        self.require(SrcState::IS_SET_UP | SrcState::HAS_LATEST_VERSION_LIST).await?;
        Ok(self.cache.get_all_versions())
    }

    /// Resolve a non-revision version to its revision, asking the cache
    /// first and refreshing the version list once on a miss (spec §4.4
    /// "Version -> revision resolution").
    pub async fn resolve_revision(&self, unpaired: &depsolve_version::UnpairedVersion) -> Result<Revision, GatewayError> {
        self.require(SrcState::IS_SET_UP).await?;
        if let Some(paired) = self.cache.get_version_by_unpaired(unpaired) {
            return Ok(paired.revision().clone());
        }
        self.require(SrcState::HAS_LATEST_VERSION_LIST).await?;
        match self.cache.get_version_by_unpaired(unpaired) {
            Some(paired) => Ok(paired.revision().clone()),
            None => Err(GatewayError::VersionNotFound {
                project: self.project.clone(),
                version: unpaired.to_string(),
            }),
        }
    }

    pub async fn get_manifest_and_lock(&self, root: &ProjectRoot, revision: &Revision, analyzer: &dyn ProjectAnalyzer) -> Result<(Manifest, Option<Lock>), GatewayError> {
        self.require(SrcState::IS_SET_UP | SrcState::EXISTS_LOCALLY).await?;

        if !self.source.revision_present_in(revision).await.map_err(GatewayError::Other)? {
            return Err(GatewayError::RevisionNotInSource {
                project: self.project.clone(),
                revision: revision.as_str().to_string(),
            });
        }

        let info = analyzer.info();
        let key = AnalyzerKey::new(info.name.clone(), info.version);
        if let Some(cached) = self.cache.get_manifest_and_lock(revision, &key) {
            trace!(project = %self.project, revision = %revision, "manifest cache hit");
            return Ok(cached);
        }

        let result = self
            .supervisor
            .do_call(self.project.normalized_source(), CallType::GetManifestAndLock, || {
                self.source.get_manifest_and_lock(root, revision, &info)
            })
            .await
            .map_err(|_| GatewayError::Timeout { project: self.project.clone() })?
            .map_err(GatewayError::Other)?;

        self.cache.set_manifest_and_lock(revision, &key, result.0.clone(), result.1.clone());
        Ok(result)
    }

    pub async fn list_packages(&self, root: &ProjectRoot, revision: &Revision) -> Result<PackageTree, GatewayError> {
        self.require(SrcState::IS_SET_UP | SrcState::EXISTS_LOCALLY).await?;
        if let Some(tree) = self.cache.get_package_tree(revision) {
            return Ok(tree);
        }
        let tree = self
            .supervisor
            .do_call(self.project.normalized_source(), CallType::ListPackages, || self.source.list_packages(root, revision))
            .await
            .map_err(|_| GatewayError::Timeout { project: self.project.clone() })?
            .map_err(GatewayError::Other)?;
        self.cache.set_package_tree(revision, tree.clone());
        Ok(tree)
    }

    pub async fn revision_present_in(&self, revision: &Revision) -> Result<bool, GatewayError> {
        self.require(SrcState::IS_SET_UP).await?;
        if self.cache.revision_exists(revision) {
            return Ok(true);
        }
        self.source.revision_present_in(revision).await.map_err(GatewayError::Other)
    }

    pub async fn export_version_to(&self, revision: &Revision, dir: &Path) -> Result<(), GatewayError> {
        self.require(SrcState::IS_SET_UP | SrcState::EXISTS_LOCALLY).await?;
        self.supervisor
            .do_call(self.project.normalized_source(), CallType::ExportTree, || self.source.export_revision_to(revision, dir))
            .await
            .map_err(|_| GatewayError::Timeout { project: self.project.clone() })?
            .map_err(GatewayError::Other)
    }

    pub async fn sync_local(&self) -> Result<(), GatewayError> {
        self.require(SrcState::IS_SET_UP | SrcState::EXISTS_LOCALLY | SrcState::HAS_LATEST_LOCALLY).await
    }

    pub async fn exists_in_cache(&self, revision: &Revision) -> bool {
        self.cache.revision_exists(revision)
    }

    pub async fn exists_upstream(&self) -> Result<bool, GatewayError> {
        match self.require(SrcState::IS_SET_UP | SrcState::EXISTS_UPSTREAM).await {
            Ok(()) => Ok(true),
            Err(GatewayError::NotUpstream { .. }) => Ok(false),
            Err(other) => {
                warn!(project = %self.project, error = %other, "exists_upstream check failed");
                Err(other)
            }
        }
    }

    pub async fn source_url(&self) -> Option<String> {
        self.inner.lock().await.resolved_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_bits_compose_and_contain() {
        let s = SrcState::IS_SET_UP | SrcState::EXISTS_LOCALLY;
        assert!(s.contains(SrcState::IS_SET_UP));
        assert!(!s.contains(SrcState::HAS_LATEST_LOCALLY));
    }
}
