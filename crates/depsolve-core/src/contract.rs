//! The contracts the core consumes from layers explicitly out of scope
//! (spec §1, §6.1-6.3): the VCS `Source`, the `ProjectAnalyzer`, and the
//! `Deducer`. The core is written entirely against these traits; nothing
//! here concerns itself with how a concrete VCS client is implemented.

use crate::digest::AnalyzerInfo;
use crate::lock::Lock;
use crate::manifest::Manifest;
use crate::package_tree::PackageTree;
use crate::project::{ProjectRoot, Source as SourceLocator};
use anyhow::Result;
use async_trait::async_trait;
use depsolve_version::{PairedVersion, Revision};
use std::path::Path;

/// What the core requires of the VCS client layer (spec §6.1). A
/// cancellation token is threaded through every call site via the
/// `tokio_util::sync::CancellationToken`-shaped convention: callers select
/// on it themselves rather than the trait forcing a particular future type,
/// since `async_trait` object-safety would otherwise rule out generic
/// cancellation tokens.
#[async_trait]
pub trait Source: Send + Sync {
    async fn exists_locally(&self) -> Result<bool>;
    async fn exists_upstream(&self) -> Result<bool>;
    async fn upstream_url(&self) -> Result<String>;
    async fn init_local(&self) -> Result<()>;
    async fn update_local(&self) -> Result<()>;
    async fn list_versions(&self) -> Result<Vec<PairedVersion>>;
    async fn get_manifest_and_lock(&self, root: &ProjectRoot, revision: &Revision, analyzer: &AnalyzerInfo) -> Result<(Manifest, Option<Lock>)>;
    async fn list_packages(&self, root: &ProjectRoot, revision: &Revision) -> Result<PackageTree>;
    async fn revision_present_in(&self, revision: &Revision) -> Result<bool>;
    async fn export_revision_to(&self, revision: &Revision, directory: &Path) -> Result<()>;
    /// An opaque label like `"git"`, `"hg"`, `"bzr"`, `"svn"`.
    fn source_type(&self) -> &'static str;
}

/// What the core requires of a project's manifest/lock extractor (spec
/// §6.2). The analyzer's identity participates in the input digest because
/// extraction is analyzer-specific — swapping analyzers must invalidate a
/// previously computed lock.
#[async_trait]
pub trait ProjectAnalyzer: Send + Sync {
    async fn derive_manifest_and_lock(&self, project_dir: &Path, project_root: &ProjectRoot) -> Result<(Manifest, Option<Lock>)>;
    fn info(&self) -> AnalyzerInfo;
}

/// Maps an arbitrary import path to a project root and candidate upstream
/// sources (spec §6.3). Implementations (well-known hosters, vanity-import
/// HTML meta tags, user registries/aliases) are non-core.
pub trait Deducer: Send + Sync {
    fn deduce_root_path(&self, import_path: &str) -> Option<(ProjectRoot, Vec<SourceLocator>)>;
}
