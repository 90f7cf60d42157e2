//! Version and constraint algebra for depsolve.
//!
//! This crate has no I/O and no async — it's the pure data layer the solver
//! builds on: the [`Version`] sum type (branches, plain tags, semver,
//! revisions, and paired versions), the [`Constraint`] algebra over it, and
//! the upgrade/downgrade total orders used by the solver's choice rule.

pub mod constraint;
pub mod range;
pub mod sort;
pub mod version;

pub use constraint::Constraint;
pub use range::SemverRange;
pub use sort::{
    downgrade_cmp, sort_for_downgrade, sort_for_upgrade, sort_paired_for_downgrade, sort_paired_for_upgrade,
    upgrade_cmp,
};
pub use version::{PairedVersion, Revision, UnpairedVersion, Version};
