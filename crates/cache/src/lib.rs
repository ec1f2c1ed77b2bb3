//! # Result Cache
//!
//! A short-lived memoization layer that sits in front of the analytics
//! engine. One TTL per cache instance; the engine owns two independent
//! tiers (raw series and computed metrics) with different TTLs.
//!
//! Staleness up to the TTL is an accepted trade-off, not a bug: there is no
//! partial invalidation when upstream data changes, only expiry and explicit
//! flush. All operations go through a single mutex, so concurrent get/put/
//! flush can interleave but can never observe a half-written entry.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// TTL memoization keyed by `K`, at most one entry per key.
pub struct ResultCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A cache on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// A cache on an injected clock, for tests that control time.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Returns the cached value if the entry exists and is younger than the
    /// TTL. An expired entry is evicted on the way out and reported as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let now = self.clock.now();
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                debug!("cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                debug!("cache expired");
                None
            }
            None => {
                debug!("cache miss");
                None
            }
        }
    }

    /// Unconditionally overwrites any existing entry for the key and resets
    /// its timestamp. Entries are replaced whole, never merged.
    pub fn put(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: self.clock.now(),
            },
        );
    }

    /// Clears all entries.
    pub fn flush(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    /// Number of stored entries, including any not yet evicted as expired.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
