//! In-memory TTL cache shared by the domain services.
//!
//! Expiry is lazy: entries are judged at read time and expired values stay
//! in the map so a service can still serve them, explicitly flagged, when
//! the upstream is down. The optional [`CacheStore::sweep`] pass bounds
//! memory by dropping entries that have been expired longer than a grace
//! window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

/// Read-time view of a cache slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Entry present and within its TTL.
    Fresh(T),
    /// Entry present but past its TTL; usable only as a degraded fallback.
    Expired(T),
    Absent,
}

impl<T> Lookup<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            Self::Fresh(value) => Some(value),
            Self::Expired(_) | Self::Absent => None,
        }
    }

    /// Any stored value, fresh or expired.
    pub fn any(self) -> Option<T> {
        match self {
            Self::Fresh(value) | Self::Expired(value) => Some(value),
            Self::Absent => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.stored_at + self.ttl
    }

    fn expired_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at + self.ttl)
    }
}

/// Thread-safe in-memory cache with per-entry TTL.
///
/// TTLs are supplied by the calling domain service on every `set`; the
/// store itself has no opinion about how long market data stays usable.
#[derive(Debug, Clone)]
pub struct CacheStore<T> {
    inner: Arc<tokio::sync::RwLock<HashMap<String, Entry<T>>>>,
}

impl<T: Clone> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> CacheStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        }
    }

    /// Acquire the backing store. The in-memory backend cannot fail; the
    /// signature exists so callers treat acquisition failure as fatal when
    /// an external backend is swapped in.
    pub async fn connect(&self) -> Result<(), crate::CoreError> {
        Ok(())
    }

    /// Release the backing store. Problems during shutdown are logged and
    /// swallowed, never propagated.
    pub async fn disconnect(&self) {
        let mut map = self.inner.write().await;
        let dropped = map.len();
        map.clear();
        debug!(entries = dropped, "cache store disconnected");
    }

    /// Look up `key`, classifying the entry at read time. No side effects.
    pub async fn lookup(&self, key: &str) -> Lookup<T> {
        let map = self.inner.read().await;
        match map.get(key) {
            Some(entry) if entry.is_fresh(Instant::now()) => Lookup::Fresh(entry.value.clone()),
            Some(entry) => Lookup::Expired(entry.value.clone()),
            None => Lookup::Absent,
        }
    }

    /// Unconditionally overwrite `key`, stamping `stored_at = now`.
    pub async fn set(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let mut map = self.inner.write().await;
        map.insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove the entry if present; no-op otherwise.
    pub async fn invalidate(&self, key: &str) {
        let mut map = self.inner.write().await;
        map.remove(key);
    }

    /// Drop entries that have been expired for longer than `retain_stale_for`.
    ///
    /// Entries inside the grace window survive so they remain available for
    /// stale-data fallback.
    pub async fn sweep(&self, retain_stale_for: Duration) {
        let now = Instant::now();
        let mut map = self.inner.write().await;
        map.retain(|_, entry| entry.is_fresh(now) || entry.expired_for(now) <= retain_stale_for);
    }

    /// Number of entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit_then_overwrite() {
        let cache: CacheStore<String> = CacheStore::new();
        let ttl = Duration::from_secs(60);

        assert_eq!(cache.lookup("k").await, Lookup::Absent);

        cache.set("k", String::from("v1"), ttl).await;
        assert_eq!(cache.lookup("k").await, Lookup::Fresh(String::from("v1")));

        // Last write wins.
        cache.set("k", String::from("v2"), ttl).await;
        assert_eq!(cache.lookup("k").await, Lookup::Fresh(String::from("v2")));
    }

    #[tokio::test]
    async fn expired_entry_is_reported_not_dropped() {
        let cache: CacheStore<u32> = CacheStore::new();

        cache.set("k", 7, Duration::from_millis(20)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.lookup("k").await, Lookup::Expired(7));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn refetch_repopulates_after_expiry() {
        let cache: CacheStore<u32> = CacheStore::new();

        cache.set("k", 1, Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.lookup("k").await.fresh().is_none());

        cache.set("k", 2, Duration::from_secs(60)).await;
        assert_eq!(cache.lookup("k").await, Lookup::Fresh(2));
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache: CacheStore<u32> = CacheStore::new();
        cache.set("k", 1, Duration::from_secs(60)).await;

        cache.invalidate("k").await;
        assert_eq!(cache.lookup("k").await, Lookup::Absent);

        // Invalidating an absent key is a no-op.
        cache.invalidate("k").await;
    }

    #[tokio::test]
    async fn sweep_respects_stale_grace_window() {
        let cache: CacheStore<u32> = CacheStore::new();

        cache.set("old", 1, Duration::from_millis(5)).await;
        cache.set("live", 2, Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        // Generous grace keeps the expired entry around for fallback.
        cache.sweep(Duration::from_secs(60)).await;
        assert_eq!(cache.len().await, 2);

        // Zero grace drops it.
        cache.sweep(Duration::ZERO).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.lookup("live").await, Lookup::Fresh(2));
    }

    #[tokio::test]
    async fn disconnect_clears_entries() {
        let cache: CacheStore<u32> = CacheStore::new();
        cache.connect().await.expect("in-memory connect succeeds");
        cache.set("k", 1, Duration::from_secs(60)).await;

        cache.disconnect().await;
        assert!(cache.is_empty().await);
    }
}
