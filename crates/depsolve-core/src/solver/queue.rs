//! Per-project version queue (spec §4.9): the ordered list of candidate
//! versions to try, filtered by the currently effective constraint and any
//! prior failure exclusions, with an optional "preferred version tried
//! first" override.

use depsolve_version::{Constraint, Version};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct VersionQueue {
    /// Every candidate the gateway reported for this project, sorted per
    /// direction with any preferred version moved to the front, kept around
    /// *unfiltered* so the queue can be rebuilt against a relaxed (or
    /// tightened) constraint without re-querying the gateway.
    all: Vec<Version>,
    /// `all` filtered by `constraint`, front first. This is what `remaining`
    /// walks.
    ordered: Vec<Version>,
    /// The constraint `ordered` was last filtered against — compared on
    /// `refilter_if_changed` so an unchanged constraint is a no-op.
    constraint: Constraint,
    excluded: HashSet<Version>,
}

impl VersionQueue {
    /// Build a queue from every version the gateway reports, filtered by
    /// `constraint`, sorted per `downgrade` direction, with `preferred`
    /// (if still admitted) moved to the front (spec §4.9 "Preferred
    /// versions").
    pub fn build(mut candidates: Vec<Version>, constraint: &Constraint, downgrade: bool, preferred: Option<&Version>) -> Self {
        if downgrade {
            depsolve_version::sort_for_downgrade(&mut candidates);
        } else {
            depsolve_version::sort_for_upgrade(&mut candidates);
        }

        if let Some(pref) = preferred {
            if let Some(pos) = candidates.iter().position(|v| v == pref) {
                let v = candidates.remove(pos);
                candidates.insert(0, v);
            }
        }

        let ordered: Vec<Version> = candidates.iter().filter(|v| constraint.matches(v)).cloned().collect();
        Self { all: candidates, ordered, constraint: constraint.clone(), excluded: HashSet::new() }
    }

    /// Re-derive `remaining()` against `constraint` when it differs from the
    /// one the queue was last (re)built against, without losing the
    /// `excluded` set accumulated by failed attempts. A project backtracked
    /// past must re-admit versions a since-undone constraint had ruled out
    /// at build time, rather than reuse a queue narrowed forever by the
    /// tightest constraint ever in effect (spec §4.9).
    pub fn refilter_if_changed(&mut self, constraint: &Constraint) {
        if &self.constraint == constraint {
            return;
        }
        self.constraint = constraint.clone();
        self.ordered = self.all.iter().filter(|v| constraint.matches(v)).cloned().collect();
    }

    /// Exclude a version from future `next()` calls (used after a version
    /// fails, per spec §4.9's backjump: "exclude the just-tried version of
    /// the offending project from its queue").
    pub fn exclude(&mut self, version: &Version) {
        self.excluded.insert(version.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.iter().all(|v| self.excluded.contains(v))
    }

    pub fn remaining(&self) -> impl Iterator<Item = &Version> {
        self.ordered.iter().filter(move |v| !self.excluded.contains(*v))
    }

    pub fn len_known(&self) -> usize {
        self.ordered.len()
    }
}
