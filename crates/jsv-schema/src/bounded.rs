//! # Bounded Cache
//!
//! A thread-safe LRU map shared by the schema registry and the validator
//! cache. `LruCache::get` reorders entries, so every access takes the lock.
//! Values are cheap to clone (`Arc`s) and are cloned out before the lock is
//! released.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Capacity used when a configured capacity is zero.
pub const DEFAULT_CAPACITY: usize = 256;

/// A mutex-guarded LRU cache.
#[derive(Debug)]
pub struct BoundedCache<K: Hash + Eq, V> {
    store: Mutex<LruCache<K, V>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// A cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Look up and promote an entry.
    pub fn get(&self, key: &K) -> Option<V> {
        self.store.lock().get(key).cloned()
    }

    /// Insert, evicting the least recently used entry when full.
    pub fn put(&self, key: K, value: V) {
        self.store.lock().put(key, value);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.store.lock().cap().get()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.store.lock().clear();
    }
}
