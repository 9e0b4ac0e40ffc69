//! The no-op cache variant.

use super::AgeAwareCache;

/// An [`AgeAwareCache`] that never holds anything.
///
/// Every call returns `None` without consulting the fallback and nothing is
/// ever stored. Useful where an age-aware cache is required by signature
/// but caching is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCache;

impl DisabledCache {
    /// A new disabled cache.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<K, V> AgeAwareCache<K, V> for DisabledCache
where
    K: Send + Sync,
    V: Send + Sync,
{
    fn get(
        &self,
        _key: &K,
        _max_age_ms: u64,
        _fallback: &mut dyn FnMut() -> Option<V>,
    ) -> Option<V> {
        None
    }
}
