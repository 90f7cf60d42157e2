use serde::{Deserialize, Serialize};

/// Cache refresh mode, consulted before the gateway (or anything above it)
/// is allowed to hit the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CacheMode {
    /// Use the cache if it's fresh, otherwise fetch (default).
    #[default]
    Normal,
    /// Force a refresh, ignoring whatever is cached.
    Refresh,
    /// Use the cache only; fail rather than go upstream (offline mode).
    Offline,
    /// Skip the cache entirely, always fetch (CI / reproducibility testing).
    NoCache,
}

impl CacheMode {
    /// Whether a cached entry may be returned without checking freshness
    /// against upstream first.
    pub fn allows_cached_read(self) -> bool {
        matches!(self, Self::Normal | Self::Offline)
    }

    /// Whether this mode permits a network call at all.
    pub fn allows_upstream(self) -> bool {
        !matches!(self, Self::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_forbids_upstream_but_allows_cache() {
        assert!(CacheMode::Offline.allows_cached_read());
        assert!(!CacheMode::Offline.allows_upstream());
    }

    #[test]
    fn no_cache_allows_upstream_but_not_cached_reads() {
        assert!(!CacheMode::NoCache.allows_cached_read());
        assert!(CacheMode::NoCache.allows_upstream());
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(CacheMode::default(), CacheMode::Normal);
    }
}
