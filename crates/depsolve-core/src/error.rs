//! Structured error types for the resolver core (spec §6.5, §7).
//!
//! Each concern gets its own enum, the way `vx-resolver`'s pipeline splits
//! `ResolveError` / `EnsureError` / `PrepareError` / `ExecuteError` and
//! aggregates them into one top-level type with an `Other(anyhow::Error)`
//! escape hatch for call sites that aren't part of the public contract.

use crate::project::ProjectIdentifier;
use depsolve_version::Version;
use thiserror::Error;

/// `(version, reason)` — one attempted-and-rejected version, surfaced on a
/// `NoVersionError` so a caller can reconstruct why every candidate failed.
#[derive(Debug, Clone)]
pub struct VersionRejection {
    pub version: Version,
    pub reason: String,
}

/// No version of a project satisfied every constraint placed on it. Carries
/// enough detail (spec §7 "Attribution") to reconstruct the conflict chain.
#[derive(Debug, Error)]
#[error("no version of {project} satisfies the constraints in play ({} attempted)", attempts.len())]
pub struct NoVersionError {
    pub project: ProjectIdentifier,
    pub attempts: Vec<VersionRejection>,
    /// Atoms already in `selected` whose constraints contributed to the
    /// conflict; used by conflict-directed backjumping to pick a pop target.
    pub culprits: Vec<ProjectIdentifier>,
}

impl NoVersionError {
    /// A plain-language rendering of the structured failure. The structured
    /// kind stays primary (per spec §6.5 "inspectable kinds, not strings");
    /// this is purely a convenience for a CLI's error output.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "no version of {} satisfies the active constraints\n",
            self.project
        );
        for rejection in &self.attempts {
            out.push_str(&format!("  - {}: {}\n", rejection.version, rejection.reason));
        }
        if !self.culprits.is_empty() {
            out.push_str("conflicting with:\n");
            for c in &self.culprits {
                out.push_str(&format!("  - {}\n", c));
            }
        }
        out
    }
}

/// Solver-level failures (spec §6.5, §4.9).
#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    NoVersion(#[from] NoVersionError),

    #[error("constraint on {project} is disjoint with what is already selected")]
    DisjointConstraint { project: ProjectIdentifier },

    #[error("{project} was requested from two different sources")]
    SourceMismatch { project: ProjectIdentifier },

    #[error("import path '{found}' differs only in case from already-selected '{existing}'")]
    CaseMismatch { found: String, existing: String },

    #[error("import path '{path}' has the wrong case for project root '{root}'")]
    WrongCase { path: String, root: String },

    #[error("{project}@{version} is missing required package(s): {}", packages.join(", "))]
    CheckeeHasProblemPackages {
        project: ProjectIdentifier,
        version: Version,
        packages: Vec<String>,
    },

    #[error("a dependency of {project}@{version} has problem package(s): {}", packages.join(", "))]
    DepHasProblemPackages {
        project: ProjectIdentifier,
        version: Version,
        packages: Vec<String>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Source-gateway failures (spec §4.4).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{project} does not exist upstream")]
    NotUpstream { project: ProjectIdentifier },

    #[error("version '{version}' does not exist in source for {project}")]
    VersionNotFound {
        project: ProjectIdentifier,
        version: String,
    },

    #[error("revision '{revision}' is not present in source for {project}; refusing to proceed")]
    RevisionNotInSource {
        project: ProjectIdentifier,
        revision: String,
    },

    #[error("could not set up source for {project}: {reason}")]
    SetupFailed { project: ProjectIdentifier, reason: String },

    #[error("operation on {project} timed out")]
    Timeout { project: ProjectIdentifier },

    #[error("operation on {project} was canceled")]
    Canceled { project: ProjectIdentifier },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Source-coordinator failures (spec §4.5).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("could not deduce a project root for import path '{import_path}'")]
    DeductionFailed { import_path: String },

    #[error("gateway creation for '{name}' failed: {reason}")]
    GatewayCreationFailed { name: String, reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Supervisor failures (spec §4.6).
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("supervisor terminated")]
    Terminated,

    #[error("call '{name}' ({call_type:?}) timed out")]
    Timeout { name: String, call_type: String },
}

/// Input-digest failures (spec §4.8). The digest computation is pure and
/// essentially infallible; this exists for completeness and for analyzer
/// identity validation.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("analyzer name must not be empty")]
    EmptyAnalyzerName,
}

/// `Prepare`-time validation failures (spec §6.4).
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("root package tree contains an error for package '{package}': {reason}")]
    RootPackageTreeError { package: String, reason: String },

    #[error("two imports differ only by letter case: '{a}' vs '{b}'")]
    CaseConflict { a: String, b: String },

    #[error("requested to change '{project}' but no previous lock was supplied")]
    NoPreviousLock { project: ProjectIdentifier },

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Top-level error aggregating every concern, the way `vx-resolver`'s
/// `PipelineError` wraps its stage errors.
#[derive(Debug, Error)]
pub enum DepsolveError {
    #[error("solver: {0}")]
    Solver(#[from] SolverError),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("coordinator: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("supervisor: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("digest: {0}")]
    Digest(#[from] DigestError),

    #[error("prepare: {0}")]
    Prepare(#[from] PrepareError),

    #[error("could not create lock: {0}")]
    CouldNotCreateLock(String),

    #[error("source manager released")]
    SourceManagerReleased,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias matching the teacher's `vx_resolver::Result`.
pub type Result<T> = std::result::Result<T, DepsolveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectRoot;

    #[test]
    fn describe_renders_attempts_and_culprits() {
        let project = ProjectIdentifier::new(ProjectRoot::new("example.org/a"), None);
        let err = NoVersionError {
            project: project.clone(),
            attempts: vec![VersionRejection {
                version: Version::plain("v1"),
                reason: "disjoint constraint".into(),
            }],
            culprits: vec![project],
        };
        let rendered = err.describe();
        assert!(rendered.contains("v1"));
        assert!(rendered.contains("disjoint constraint"));
        assert!(rendered.contains("conflicting with"));
    }

    #[test]
    fn pipeline_errors_wrap_into_top_level() {
        let project = ProjectIdentifier::new(ProjectRoot::new("example.org/a"), None);
        let solver_err = SolverError::SourceMismatch { project };
        let top: DepsolveError = solver_err.into();
        assert!(matches!(top, DepsolveError::Solver(_)));
    }
}
