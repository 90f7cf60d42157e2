//! A [`crate::solver::ProjectProvider`] built on top of the coordinator and
//! gateway layers (spec §6.4 "Prepare" wires these together) — the piece
//! that lets the solver ask "what versions exist" and "what does this
//! version declare" without knowing anything about VCS, caching, or call
//! coalescing.

use crate::contract::{Deducer, ProjectAnalyzer};
use crate::coordinator::{SourceCoordinator, SourceFactory};
use crate::error::SolverError;
use crate::manifest::Manifest;
use crate::package_tree::PackageTree;
use crate::project::ProjectIdentifier;
use crate::solver::ProjectProvider;
use async_trait::async_trait;
use depsolve_version::{PairedVersion, Revision, Version};
use std::sync::Arc;

fn to_solver_error<E: std::fmt::Display>(err: E) -> SolverError {
    SolverError::Other(anyhow::anyhow!(err.to_string()))
}

/// Adapts a [`SourceCoordinator`] plus one [`ProjectAnalyzer`] into the
/// provider interface the bimodal search consumes.
pub struct CoordinatorProvider<D: Deducer, F: SourceFactory, A: ProjectAnalyzer> {
    coordinator: Arc<SourceCoordinator<D, F>>,
    analyzer: Arc<A>,
}

impl<D: Deducer, F: SourceFactory, A: ProjectAnalyzer> CoordinatorProvider<D, F, A> {
    pub fn new(coordinator: Arc<SourceCoordinator<D, F>>, analyzer: Arc<A>) -> Self {
        Self { coordinator, analyzer }
    }

    async fn revision_for(&self, project: &ProjectIdentifier, version: &Version) -> Result<Revision, SolverError> {
        match version {
            Version::Revision(r) => Ok(r.clone()),
            Version::Paired(p) => Ok(p.revision().clone()),
            Version::Unpaired(u) => {
                let gateway = self.coordinator.get_gateway(project.root.as_str()).await.map_err(to_solver_error)?;
                gateway.resolve_revision(u).await.map_err(to_solver_error)
            }
        }
    }
}

#[async_trait]
impl<D, F, A> ProjectProvider for CoordinatorProvider<D, F, A>
where
    D: Deducer + Send + Sync,
    F: SourceFactory + Send + Sync,
    A: ProjectAnalyzer + Send + Sync,
{
    async fn resolve_import(&self, import_path: &str) -> Result<(ProjectIdentifier, String), SolverError> {
        let gateway = self.coordinator.get_gateway(import_path).await.map_err(to_solver_error)?;
        Ok((gateway.project.clone(), import_path.to_string()))
    }

    async fn candidate_versions(&self, project: &ProjectIdentifier) -> Result<Vec<PairedVersion>, SolverError> {
        let gateway = self.coordinator.get_gateway(project.root.as_str()).await.map_err(to_solver_error)?;
        gateway.list_versions().await.map_err(to_solver_error)
    }

    async fn manifest_and_tree(&self, project: &ProjectIdentifier, version: &Version) -> Result<(Manifest, PackageTree), SolverError> {
        let gateway = self.coordinator.get_gateway(project.root.as_str()).await.map_err(to_solver_error)?;
        let revision = self.revision_for(project, version).await?;
        let (manifest, _previous_lock) = gateway
            .get_manifest_and_lock(&project.root, &revision, self.analyzer.as_ref())
            .await
            .map_err(to_solver_error)?;
        let tree = gateway.list_packages(&project.root, &revision).await.map_err(to_solver_error)?;
        Ok((manifest, tree))
    }
}
