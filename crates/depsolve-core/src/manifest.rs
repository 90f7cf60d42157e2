//! A project's declared constraints, overrides, requires and ignores
//! (spec §3 "Project constraints / overrides / requires / ignores").

use crate::project::{ProjectRoot, Source};
use crate::reach::IgnorePattern;
use depsolve_version::Constraint;
use std::collections::BTreeMap;

/// One declared dependency constraint, with an optional source override.
#[derive(Debug, Clone)]
pub struct ProjectConstraint {
    pub source: Option<Source>,
    pub constraint: Constraint,
}

impl ProjectConstraint {
    pub fn new(constraint: Constraint) -> Self {
        Self { source: None, constraint }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }
}

/// A manifest: everything a single project (root or dependency) declares
/// about how it wants to be resolved.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// project-root -> declared constraint.
    pub constraints: BTreeMap<ProjectRoot, ProjectConstraint>,
    /// Root-only: supersedes any inner project's constraint for the same
    /// project-root. Ignored when the manifest belongs to a dependency.
    pub overrides: BTreeMap<ProjectRoot, ProjectConstraint>,
    /// Import paths forced into the build graph even without a live import.
    pub requires: Vec<String>,
    /// Import paths (possibly wildcarded) to drop from any reach computation.
    pub ignores: Vec<IgnorePattern>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraint(mut self, root: ProjectRoot, constraint: ProjectConstraint) -> Self {
        self.constraints.insert(root, constraint);
        self
    }

    pub fn with_override(mut self, root: ProjectRoot, constraint: ProjectConstraint) -> Self {
        self.overrides.insert(root, constraint);
        self
    }

    pub fn with_require(mut self, import_path: impl Into<String>) -> Self {
        self.requires.push(import_path.into());
        self
    }

    pub fn with_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignores.push(IgnorePattern::new(pattern));
        self
    }
}
