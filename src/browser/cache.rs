//! In-memory cache for the browser's control endpoint.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Holds at most one control endpoint with an expiry.
///
/// Writers replace the whole entry under a short write lock, so readers see
/// either the old or the new endpoint, never a mix. Concurrent refreshers are
/// last-writer-wins.
#[derive(Clone)]
pub struct EndpointCache {
    entry: Arc<RwLock<Option<Entry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for EndpointCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EndpointCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointCache")
            .field("entry", &*self.entry.read())
            .finish()
    }
}

impl EndpointCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: Arc::new(RwLock::new(None)),
            clock,
        }
    }

    /// The cached endpoint, if one is stored and has not expired.
    pub fn get(&self) -> Option<String> {
        let now = self.clock.now();
        self.entry
            .read()
            .as_ref()
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, value: impl Into<String>, ttl: Duration) {
        let now = self.clock.now();
        // Saturate instead of panicking on absurd TTLs.
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(100 * 365 * 24 * 60 * 60));
        *self.entry.write() = Some(Entry {
            value: value.into(),
            expires_at,
        });
    }

    pub fn invalidate(&self) {
        self.entry.write().take();
    }

    /// Expiry of the stored entry, live or not.
    pub fn expires_at(&self) -> Option<Instant> {
        self.entry.read().as_ref().map(|entry| entry.expires_at)
    }
}
