//! In-memory TTL cache with an injectable clock.
//!
//! Expiry is lazy: an expired entry reads as absent and stays in the map
//! until the next successful fetch for its key replaces it. Lock poisoning
//! degrades to a miss (reads) or a skipped write; cache operations never fail.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::warn;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used to drive expiry in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// TtlCache
// ---------------------------------------------------------------------------

/// A cached value and its validity window.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Read-only snapshot of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Stored entries, expired ones included until they are replaced.
    pub size: usize,
    pub ttl_hours: u64,
}

/// Thread-safe map whose entries expire a fixed time after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: TimeDelta,
    ttl_hours: u64,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl_hours: u64, clock: Arc<dyn Clock>) -> Self {
        let ttl = i64::try_from(ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .unwrap_or(TimeDelta::MAX);

        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            ttl_hours,
            clock,
        }
    }

    /// The value under `key`, if present and not yet expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let Ok(entries) = self.entries.read() else {
            warn!("cache lock poisoned, treating read as a miss");
            return None;
        };
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn put(&self, key: K, value: V) {
        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let Ok(mut entries) = self.entries.write() else {
            warn!("cache lock poisoned, skipping write");
            return;
        };
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at,
                expires_at,
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl_hours(&self) -> u64 {
        self.ttl_hours
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            ttl_hours: self.ttl_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn cache(ttl_hours: u64) -> (TtlCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        (TtlCache::new(ttl_hours, clock.clone()), clock)
    }

    #[test]
    fn entries_expire_after_ttl() {
        let (cache, clock) = cache(24);
        cache.put("k".into(), 1);
        assert_eq!(cache.get(&"k".into()), Some(1));

        clock.advance(TimeDelta::hours(23) + TimeDelta::minutes(59));
        assert_eq!(cache.get(&"k".into()), Some(1));

        clock.advance(TimeDelta::minutes(1));
        assert_eq!(cache.get(&"k".into()), None);
        // Expired entries still count until replaced.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_replaces_expired_entry() {
        let (cache, clock) = cache(1);
        cache.put("k".into(), 1);
        clock.advance(TimeDelta::hours(2));
        assert_eq!(cache.get(&"k".into()), None);

        cache.put("k".into(), 2);
        assert_eq!(cache.get(&"k".into()), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_never_serves() {
        let (cache, _clock) = cache(0);
        cache.put("k".into(), 1);
        assert_eq!(cache.get(&"k".into()), None);
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let (cache, clock) = cache(u64::MAX);
        cache.put("k".into(), 7);
        clock.advance(TimeDelta::days(365 * 100));
        assert_eq!(cache.get(&"k".into()), Some(7));
    }

    #[test]
    fn stats_and_clear() {
        let (cache, _clock) = cache(24);
        cache.put("a".into(), 1);
        cache.put("b".into(), 2);
        cache.put("a".into(), 3);
        assert_eq!(cache.stats(), CacheStats { size: 2, ttl_hours: 24 });

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"b".into()), None);
    }

    #[test]
    fn concurrent_writers_keep_size_consistent() {
        let (cache, _clock) = cache(24);
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100u32 {
                        cache.put(format!("key-{}", i % 50), t * 1000 + i);
                        let _ = cache.get(&format!("key-{}", (i + 7) % 50));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 50);
    }
}
