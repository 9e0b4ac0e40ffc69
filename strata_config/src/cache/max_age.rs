//! The standard age-aware cache.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::{Clock, SystemClock};

use super::AgeAwareCache;

/// One cached value and the millisecond timestamp it was stored at.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_ms: u64,
}

/// An [`AgeAwareCache`] keyed on wall-clock entry age.
///
/// A lookup is required when the key is absent or when
/// `created_ms + max_age_ms <= now`, so an entry exactly `max_age` old is
/// already stale. `None` fallback results are returned but never stored.
///
/// The entry map is guarded by a mutex that is released around the
/// fallback; two concurrent misses on one key may both run the fallback,
/// and whichever completes last wins the stored entry.
pub struct MaxAgeCache<K, V> {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> fmt::Debug for MaxAgeCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("MaxAgeCache").field("entries", &len).finish()
    }
}

impl<K, V> MaxAgeCache<K, V> {
    /// A cache reading the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// A cache reading the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for MaxAgeCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AgeAwareCache<K, V> for MaxAgeCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(
        &self,
        key: &K,
        max_age_ms: u64,
        fallback: &mut dyn FnMut() -> Option<V>,
    ) -> Option<V> {
        let now_ms = self.clock.now_ms();

        let fresh = {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries
                .get(key)
                .filter(|entry| now_ms < entry.created_ms.saturating_add(max_age_ms))
                .map(|entry| entry.value.clone())
        };
        if fresh.is_some() {
            return fresh;
        }

        let looked_up = fallback();
        if let Some(value) = &looked_up {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.insert(
                key.clone(),
                CacheEntry {
                    value: value.clone(),
                    created_ms: now_ms,
                },
            );
        }
        looked_up
    }
}
