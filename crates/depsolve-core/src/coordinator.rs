//! Source coordinator (spec §4.5): maps a normalised project name to its
//! gateway, de-duplicating concurrent gateway creation via a "proto" phase
//! that waiters attach to.

use crate::contract::{Deducer, Source};
use crate::error::CoordinatorError;
use crate::gateway::{MaybeSource, SourceGateway};
use crate::project::ProjectIdentifier;
use crate::supervisor::Supervisor;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

enum Entry {
    Ready(Arc<SourceGateway>),
    Proto(broadcast::Sender<Result<Arc<SourceGateway>, String>>),
}

/// A factory the coordinator uses to build a concrete `Source` for a
/// deduced project root — the piece the VCS layer plugs in.
pub trait SourceFactory: Send + Sync {
    fn build(&self, project: &ProjectIdentifier) -> Arc<dyn Source>;
}

pub struct SourceCoordinator<D: Deducer, F: SourceFactory> {
    by_name: Mutex<HashMap<String, Entry>>,
    by_url: Mutex<HashMap<String, Arc<SourceGateway>>>,
    deducer: D,
    factory: F,
    supervisor: Arc<Supervisor>,
}

impl<D: Deducer, F: SourceFactory> SourceCoordinator<D, F> {
    pub fn new(deducer: D, factory: F, supervisor: Arc<Supervisor>) -> Self {
        Self {
            by_name: Mutex::new(HashMap::new()),
            by_url: Mutex::new(HashMap::new()),
            deducer,
            factory,
            supervisor,
        }
    }

    /// Look up (or create) the gateway for `import_path`'s project.
    pub async fn get_gateway(&self, import_path: &str) -> Result<Arc<SourceGateway>, CoordinatorError> {
        let (root, candidates) = self
            .deducer
            .deduce_root_path(import_path)
            .ok_or_else(|| CoordinatorError::DeductionFailed { import_path: import_path.to_string() })?;

        let project = ProjectIdentifier::new(root, None);
        let name = project.normalized_source().to_string();

        // Fast path: already resolved.
        {
            let guard = self.by_name.lock().await;
            if let Some(Entry::Ready(gw)) = guard.get(&name) {
                return Ok(gw.clone());
            }
        }

        // Either attach to an in-flight "proto" phase, or become its creator.
        let maybe_rx = {
            let mut guard = self.by_name.lock().await;
            match guard.get(&name) {
                Some(Entry::Ready(gw)) => return Ok(gw.clone()),
                Some(Entry::Proto(tx)) => Some(tx.subscribe()),
                None => {
                    let (tx, _rx) = broadcast::channel(1);
                    guard.insert(name.clone(), Entry::Proto(tx));
                    None
                }
            }
        };

        if let Some(mut rx) = maybe_rx {
            debug!(name, "waiting for in-flight gateway creation");
            return match rx.recv().await {
                Ok(Ok(gw)) => Ok(gw),
                Ok(Err(reason)) => Err(CoordinatorError::GatewayCreationFailed { name, reason }),
                Err(_) => Err(CoordinatorError::GatewayCreationFailed {
                    name,
                    reason: "creator dropped without broadcasting a result".into(),
                }),
            };
        }

        // We're the creator.
        let source = self.factory.build(&project);
        let gateway = Arc::new(SourceGateway::new(
            project.clone(),
            MaybeSource { candidates },
            source,
            self.supervisor.clone(),
        ));

        let setup_result = gateway.require(crate::gateway::SrcState::IS_SET_UP).await;

        let mut by_name = self.by_name.lock().await;
        let tx = match by_name.remove(&name) {
            Some(Entry::Proto(tx)) => tx,
            _ => unreachable!("we registered the proto entry ourselves"),
        };

        match setup_result {
            Ok(()) => {
                by_name.insert(name.clone(), Entry::Ready(gateway.clone()));
                if let Some(url) = gateway.source_url().await {
                    self.by_url.lock().await.insert(url, gateway.clone());
                }
                let _ = tx.send(Ok(gateway.clone()));
                Ok(gateway)
            }
            Err(err) => {
                // Errors are not cached: the proto entry is cleared so the
                // next attempt retries from scratch (spec §4.5).
                let reason = err.to_string();
                warn!(name, %reason, "gateway creation failed, clearing proto entry");
                let _ = tx.send(Err(reason.clone()));
                Err(CoordinatorError::GatewayCreationFailed { name, reason })
            }
        }
    }

    pub async fn gateway_by_url(&self, url: &str) -> Option<Arc<SourceGateway>> {
        self.by_url.lock().await.get(url).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::AnalyzerInfo;
    use crate::lock::Lock;
    use crate::manifest::Manifest;
    use crate::package_tree::PackageTree;
    use crate::project::{ProjectRoot, Source as SourceLocator};
    use async_trait::async_trait;
    use depsolve_version::{PairedVersion, Revision};
    use std::path::Path;

    struct FakeSource;

    #[async_trait]
    impl Source for FakeSource {
        async fn exists_locally(&self) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn exists_upstream(&self) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn upstream_url(&self) -> anyhow::Result<String> {
            Ok("https://example.org/a.git".into())
        }
        async fn init_local(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn update_local(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn list_versions(&self) -> anyhow::Result<Vec<PairedVersion>> {
            Ok(vec![])
        }
        async fn get_manifest_and_lock(&self, _root: &ProjectRoot, _rev: &Revision, _analyzer: &AnalyzerInfo) -> anyhow::Result<(Manifest, Option<Lock>)> {
            Ok((Manifest::new(), None))
        }
        async fn list_packages(&self, root: &ProjectRoot, _rev: &Revision) -> anyhow::Result<PackageTree> {
            Ok(PackageTree::new(root.as_str()))
        }
        async fn revision_present_in(&self, _rev: &Revision) -> anyhow::Result<bool> {
            Ok(true)
        }
        async fn export_revision_to(&self, _rev: &Revision, _dir: &Path) -> anyhow::Result<()> {
            Ok(())
        }
        fn source_type(&self) -> &'static str {
            "fake"
        }
    }

    struct FakeDeducer;
    impl Deducer for FakeDeducer {
        fn deduce_root_path(&self, import_path: &str) -> Option<(ProjectRoot, Vec<SourceLocator>)> {
            Some((ProjectRoot::new(import_path), vec![SourceLocator::new("https://example.org/a.git")]))
        }
    }

    struct FakeFactory;
    impl SourceFactory for FakeFactory {
        fn build(&self, _project: &ProjectIdentifier) -> Arc<dyn Source> {
            Arc::new(FakeSource)
        }
    }

    #[tokio::test]
    async fn second_lookup_reuses_the_same_gateway() {
        let coordinator = SourceCoordinator::new(FakeDeducer, FakeFactory, Arc::new(Supervisor::new()));
        let a = coordinator.get_gateway("example.org/a").await.unwrap();
        let b = coordinator.get_gateway("example.org/a").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn concurrent_lookups_for_the_same_name_share_one_gateway() {
        let coordinator = Arc::new(SourceCoordinator::new(FakeDeducer, FakeFactory, Arc::new(Supervisor::new())));
        let c1 = coordinator.clone();
        let c2 = coordinator.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { c1.get_gateway("example.org/concurrent").await }),
            tokio::spawn(async move { c2.get_gateway("example.org/concurrent").await }),
        );
        assert!(Arc::ptr_eq(&a.unwrap().unwrap(), &b.unwrap().unwrap()));
    }

    #[tokio::test]
    async fn unknown_import_path_fails_deduction() {
        struct NoneDeducer;
        impl Deducer for NoneDeducer {
            fn deduce_root_path(&self, _import_path: &str) -> Option<(ProjectRoot, Vec<SourceLocator>)> {
                None
            }
        }
        let coordinator = SourceCoordinator::new(NoneDeducer, FakeFactory, Arc::new(Supervisor::new()));
        let err = coordinator.get_gateway("unknown").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::DeductionFailed { .. }));
    }
}
