//! Recently sent results, for editing them in place.
//!
//! Entries expire a fixed time after insertion and are checked lazily on
//! access. When the cache is full, expired entries are purged first and then
//! the least recently used entry is evicted.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    last_used: u64,
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    tick: u64,
}

/// Bounded, time-expiring map from a message key to a sent result.
pub struct RecentResultCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> RecentResultCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache on the wall clock.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                tick: 0,
            }),
            capacity: capacity.max(1),
            ttl,
            clock,
        }
    }

    /// Insert or replace the result for `key`, restarting its time to live.
    pub fn remember(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut inner = self.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let ttl = self.ttl;
            inner
                .entries
                .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < ttl);

            if inner.entries.len() >= self.capacity {
                let lru = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(lru) = lru {
                    inner.entries.remove(&lru);
                }
            }
        }

        inner.tick += 1;
        let last_used = inner.tick;
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                last_used,
            },
        );
    }

    /// Result for `key`, unless absent or expired. Counts as a use.
    pub fn lookup(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.lock();

        let expired = match inner.entries.get(key) {
            None => return None,
            Some(entry) => now.saturating_duration_since(entry.inserted_at) >= self.ttl,
        };
        if expired {
            inner.entries.remove(key);
            return None;
        }

        inner.tick += 1;
        let tick = inner.tick;
        let entry = inner.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.value.clone())
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
