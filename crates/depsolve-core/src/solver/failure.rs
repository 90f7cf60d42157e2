//! Failure bookkeeping (spec §4.9): per-`(project, version)` rejection
//! reasons, used both for backjumping and for the user-visible
//! `NoVersionError`.

use crate::project::ProjectIdentifier;
use depsolve_version::Version;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FailureMap {
    reasons: HashMap<(ProjectIdentifier, Version), String>,
}

impl FailureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, project: ProjectIdentifier, version: Version, reason: impl Into<String>) {
        self.reasons.insert((project, version), reason.into());
    }

    pub fn reason_for(&self, project: &ProjectIdentifier, version: &Version) -> Option<&str> {
        self.reasons.get(&(project.clone(), version.clone())).map(String::as_str)
    }

    /// Every `(version, reason)` recorded for `project`, in insertion order
    /// isn't preserved by `HashMap` — callers that need a stable order (the
    /// `NoVersionError` rendering) should sort by version string themselves.
    pub fn attempts_for(&self, project: &ProjectIdentifier) -> Vec<(Version, String)> {
        let mut out: Vec<_> = self
            .reasons
            .iter()
            .filter(|((p, _), _)| p == project)
            .map(|((_, v), r)| (v.clone(), r.clone()))
            .collect();
        out.sort_by_key(|(v, _)| v.to_string());
        out
    }
}
