//! Dependency-resolution core
//!
//! This crate is the core of a bimodal dependency-resolution solver for a
//! Go-like package ecosystem: it simultaneously satisfies project-level
//! version constraints and per-package import liveness, and produces a
//! reproducible lock.
//!
//! # Architecture
//!
//! 1. **Version/constraint algebra** ([`depsolve_version`]) — branches,
//!    plain tags, semver, and revisions, with an intersection/union
//!    algebra and upgrade/downgrade total orders.
//! 2. **Reach map** ([`reach`]) — the transitive closure of external
//!    imports reachable from each internal package.
//! 3. **Source gateway/coordinator/supervisor** ([`gateway`],
//!    [`coordinator`], [`supervisor`]) — a monotonic per-source state
//!    machine, creation deduplication, and call coalescing over the
//!    consumed [`contract::Source`] trait.
//! 4. **Solver** ([`solver`]) — the bimodal backtracking search itself,
//!    driven through the [`solver::ProjectProvider`] trait.
//! 5. **Lock/digest** ([`lock`], [`digest`]) — the persisted solution and
//!    the SHA-256 fingerprint of everything that would change it.
//!
//! # Example
//!
//! ```rust,ignore
//! use depsolve_core::{prepare, SolveParameters};
//!
//! async fn example(coordinator: std::sync::Arc<MyCoordinator>, analyzer: std::sync::Arc<MyAnalyzer>) -> anyhow::Result<()> {
//!     let params = SolveParameters::new(root, package_tree, manifest);
//!     let solver = prepare(params, coordinator, analyzer)?;
//!     let solution = solver.solve().await?;
//!     println!("locked {} projects in {} attempts", solution.projects().len(), solution.attempts());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod contract;
pub mod coordinator;
pub mod digest;
pub mod error;
pub mod gateway;
pub mod lock;
pub mod manifest;
pub mod package_tree;
pub mod prepare;
pub mod project;
pub mod provider;
pub mod reach;
pub mod root;
pub mod solution;
pub mod solver;
pub mod supervisor;
pub mod trace;

pub use cache::{AnalyzerKey, DiskSingleSourceCache, MemorySingleSourceCache, SingleSourceCache};
pub use config::SolverConfig;
pub use contract::{Deducer, ProjectAnalyzer, Source};
pub use coordinator::{SourceCoordinator, SourceFactory};
pub use digest::{compute_input_digest, AnalyzerInfo};
pub use error::{DepsolveError, NoVersionError, Result, SolverError};
pub use gateway::{SourceGateway, SrcState};
pub use lock::{diff_locks, Lock, LockDiff, LockedProject, ProjectDiff, StringDiff};
pub use manifest::{Manifest, ProjectConstraint};
pub use package_tree::{Package, PackageTree};
pub use prepare::{prepare, SolveParameters};
pub use project::{ProjectIdentifier, ProjectRoot, Source as SourceLocator};
pub use provider::CoordinatorProvider;
pub use reach::{compute_reach_map, ReachMap};
pub use root::RootData;
pub use solution::Solution;
pub use solver::{ProjectProvider, Solver};
pub use supervisor::{CallType, Supervisor};
pub use trace::{SolverTrace, TraceOutcome};

// Re-export the version/constraint algebra for convenience, matching the
// way the solver's own types are spelled throughout this crate's API.
pub use depsolve_version::{Constraint, PairedVersion, Revision, SemverRange, UnpairedVersion, Version};
