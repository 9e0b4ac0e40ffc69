//! Age-aware caching for lookup results.
//!
//! The cache treats the age given at lookup time as a "no older than"
//! bound: an entry that has been cached for at least that long triggers a
//! fresh lookup through the fallback. [`MaxAgeCache`] implements the policy;
//! [`DisabledCache`] is the no-op stand-in for callers that must provide a
//! cache but want every lookup to go to the fallback.

use std::time::Duration;

mod disabled;
mod max_age;

pub use disabled::DisabledCache;
pub use max_age::MaxAgeCache;

/// A key-value cache whose entries expire relative to a caller-supplied
/// maximum age.
pub trait AgeAwareCache<K, V>: Send + Sync {
    /// Returns the cached value for `key` when one exists that is younger
    /// than `max_age_ms`; otherwise runs `fallback`, stores a non-`None`
    /// result, and returns it.
    ///
    /// An entry exactly `max_age_ms` old is stale. A zero age forces a
    /// lookup on every call while still storing results.
    fn get(
        &self,
        key: &K,
        max_age_ms: u64,
        fallback: &mut dyn FnMut() -> Option<V>,
    ) -> Option<V>;

    /// [`AgeAwareCache::get`] with the age given as a [`Duration`].
    fn get_no_older_than(
        &self,
        key: &K,
        max_age: Duration,
        fallback: &mut dyn FnMut() -> Option<V>,
    ) -> Option<V> {
        let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        self.get(key, max_age_ms, fallback)
    }

    /// Forces a lookup through `fallback`, storing its result.
    fn get_fresh(&self, key: &K, fallback: &mut dyn FnMut() -> Option<V>) -> Option<V> {
        self.get(key, 0, fallback)
    }
}
