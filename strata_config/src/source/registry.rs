//! Ordered collection of sources with reverse-registration priority.

use std::fmt;
use std::sync::Arc;

use super::Source;

/// The finalized list of sources a loader scans.
///
/// Sources are held in registration order; [`SourceRegistry::find`] walks
/// them back-to-front so the source registered last wins. The registry is
/// immutable once built.
pub(crate) struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("labels", &self.labels().collect::<Vec<_>>())
            .finish()
    }
}

impl SourceRegistry {
    pub(crate) fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self { sources }
    }

    /// Scans from highest to lowest priority, returning the first hit and
    /// the label of the source that produced it.
    pub(crate) fn find(&self, key: &str) -> Option<(String, &str)> {
        self.sources
            .iter()
            .rev()
            .find_map(|source| source.find(key).map(|value| (value, source.label())))
    }

    /// Source labels in registration order.
    pub(crate) fn labels(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| source.label())
    }
}
