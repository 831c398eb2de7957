//! Time-bounded memoization of expensive fleet computations.
//!
//! One entry per key, replaced wholesale on refresh. Producers run outside
//! the lock, so two callers hitting the same stale key may both recompute;
//! the later write wins.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
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

/// A clock that only moves when told to.
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

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: DateTime<Utc>,
}

/// Keyed TTL cache.
pub struct ResultCache<C: Clock = SystemClock> {
    clock: C,
    entries: RwLock<HashMap<String, Entry>>,
}

impl ResultCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ResultCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ResultCache<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the value stored under `key` if it is younger than `ttl`,
    /// otherwise runs `producer`, stores its output stamped with the current
    /// time and returns it.
    ///
    /// An entry of a different type under the same key is treated as a miss
    /// and overwritten.
    pub fn get_or_compute<T, F>(&self, key: &str, ttl: Duration, producer: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let now = self.clock.now();

        if let Some(value) = self.fresh::<T>(key, ttl, now) {
            debug!(key, "Cache hit");
            return value;
        }

        debug!(key, "Cache miss, recomputing");
        let value = Arc::new(producer());
        let stored_at = self.clock.now();

        self.entries.write().insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                stored_at,
            },
        );

        value
    }

    fn fresh<T: Send + Sync + 'static>(
        &self,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<Arc<T>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;

        // A clock that moved backwards leaves the entry fresh.
        let within_ttl = match (now - entry.stored_at).to_std() {
            Ok(elapsed) => elapsed < ttl,
            Err(_) => true,
        };
        if !within_ttl {
            return None;
        }

        entry.value.clone().downcast::<T>().ok()
    }

    /// When the entry under `key` was last written.
    pub fn stored_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.read().get(key).map(|e| e.stored_at)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(60);

    fn cache() -> ResultCache<ManualClock> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ResultCache::with_clock(ManualClock::new(start))
    }

    #[test]
    fn test_second_call_within_ttl_hits() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let produce = || {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![1, 2, 3]
        };

        let first = cache.get_or_compute("fleet-dataset", TTL, produce);
        cache.clock().advance(Duration::from_secs(59));
        let second = cache.get_or_compute("fleet-dataset", TTL, produce);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_expired_entry_recomputes_and_restamps() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let produce = || calls.fetch_add(1, Ordering::SeqCst);

        let first = cache.get_or_compute("statistics:class=all", TTL, produce);
        let first_stamp = cache.stored_at("statistics:class=all").unwrap();

        cache.clock().advance(TTL);
        let second = cache.get_or_compute("statistics:class=all", TTL, produce);
        let second_stamp = cache.stored_at("statistics:class=all").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!((*first, *second), (0, 1));
        assert_eq!(second_stamp - first_stamp, chrono::Duration::seconds(60));
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = cache();
        let a = cache.get_or_compute("a", TTL, || "alpha".to_string());
        let b = cache.get_or_compute("b", TTL, || "beta".to_string());

        assert_eq!(a.as_str(), "alpha");
        assert_eq!(b.as_str(), "beta");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let cache = cache();
        cache.get_or_compute("k", TTL, || 1u32);
        let value = cache.get_or_compute("k", TTL, || "text".to_string());

        assert_eq!(value.as_str(), "text");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_per_key_ttl() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let produce = || calls.fetch_add(1, Ordering::SeqCst);

        cache.get_or_compute("summary", Duration::from_secs(300), produce);
        cache.clock().advance(Duration::from_secs(120));
        cache.get_or_compute("summary", Duration::from_secs(300), produce);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.get_or_compute("summary", Duration::from_secs(60), produce);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let produce = || calls.fetch_add(1, Ordering::SeqCst);

        cache.get_or_compute("a", TTL, produce);
        cache.get_or_compute("b", TTL, produce);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.stored_at("a").is_none());

        cache.get_or_compute("a", TTL, produce);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_clock_moving_backwards_keeps_entry() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let produce = || calls.fetch_add(1, Ordering::SeqCst);

        cache.get_or_compute("k", TTL, produce);
        cache
            .clock()
            .set(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap());
        cache.get_or_compute("k", TTL, produce);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_readers_share_entry() {
        let cache = Arc::new(cache());
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_compute("shared", TTL, || calls.fetch_add(1, Ordering::SeqCst));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    *cache.get_or_compute("shared", TTL, || calls.fetch_add(1, Ordering::SeqCst))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
