//! Resolver-wide configuration (spec §2 `SolveParameters`, §4.9 "Downgrade
//! mode"), shaped after the teacher's `vx_resolver::config::ResolverConfig`:
//! a small struct with a sensible [`Default`] rather than a constructor that
//! demands every field at every call site.

use depsolve_cache::CacheMode;

/// Settings that steer one solve but don't change its inputs (and so don't
/// participate in [`crate::digest::compute_input_digest`] — only the
/// `downgrade` flag affects search order; it does not affect which lock is
/// "correct", only which one is found first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Use the downgrade comparator for every version queue instead of the
    /// upgrade comparator (spec §4.9).
    pub downgrade: bool,
    /// How the gateway/cache layer is allowed to consult upstream.
    pub cache_mode: CacheMode,
    /// Override for the disk cache's invalidation window; `None` means use
    /// [`depsolve_cache::DEFAULT_EPOCH_WINDOW_SECS`].
    pub cache_epoch_window_secs: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            downgrade: false,
            cache_mode: CacheMode::Normal,
            cache_epoch_window_secs: None,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_downgrade(mut self, downgrade: bool) -> Self {
        self.downgrade = downgrade;
        self
    }

    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    pub fn with_cache_epoch_window_secs(mut self, secs: u64) -> Self {
        self.cache_epoch_window_secs = Some(secs);
        self
    }

    pub fn effective_epoch_window_secs(&self) -> u64 {
        self.cache_epoch_window_secs.unwrap_or(depsolve_cache::DEFAULT_EPOCH_WINDOW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_upgrade_mode_with_normal_cache() {
        let cfg = SolverConfig::new();
        assert!(!cfg.downgrade);
        assert_eq!(cfg.cache_mode, CacheMode::Normal);
    }

    #[test]
    fn builder_methods_compose() {
        let cfg = SolverConfig::new().with_downgrade(true).with_cache_mode(CacheMode::Offline);
        assert!(cfg.downgrade);
        assert_eq!(cfg.cache_mode, CacheMode::Offline);
    }

    #[test]
    fn effective_epoch_window_falls_back_to_default() {
        let cfg = SolverConfig::new();
        assert_eq!(cfg.effective_epoch_window_secs(), depsolve_cache::DEFAULT_EPOCH_WINDOW_SECS);
        let cfg2 = cfg.with_cache_epoch_window_secs(42);
        assert_eq!(cfg2.effective_epoch_window_secs(), 42);
    }
}
