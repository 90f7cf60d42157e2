use std::time::SystemTime;

/// Current unix epoch seconds.
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Default invalidation window for disk-cached single-source entries: a
/// week. Spec §4.3 leaves the retention policy unspecified ("the
/// implementation is free to choose one"); a week matches the teacher's
/// `DEFAULT_INDEX_TTL`-style conservative default for slow-moving data.
pub const DEFAULT_EPOCH_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Is `entry_epoch` still inside the invalidation window measured from `now`?
///
/// An entry written in the future (clock skew, corrupted data) is treated as
/// stale rather than trusted.
pub fn is_fresh(entry_epoch: u64, now: u64, window_secs: u64) -> bool {
    entry_epoch <= now && now - entry_epoch <= window_secs
}
