//! The bimodal solver (spec §4.9): atoms, per-project version queues,
//! failure bookkeeping, and the search itself.

pub mod atom;
pub mod failure;
pub mod queue;
pub mod solve;

pub use atom::{Atom, BimodalIdentifier, SelectedAtom};
pub use failure::FailureMap;
pub use queue::VersionQueue;
pub use solve::{ProjectProvider, Solver};
