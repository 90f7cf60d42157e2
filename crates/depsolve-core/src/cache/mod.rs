//! Single-source cache (spec §4.3): per-project memoisation keyed by
//! revision, for version lists, manifests+locks, and package trees.

mod disk;
mod memory;
mod single_source;

pub use disk::DiskSingleSourceCache;
pub use memory::MemorySingleSourceCache;
pub use single_source::{AnalyzerKey, SingleSourceCache};
