//! Configuration sources: named string→string lookups.
//!
//! A source is a label plus a lookup function. The loader scans its sources
//! in reverse registration order, so the source added last is consulted
//! first. Convenience implementations wrap closures, maps, and `.properties`
//! files.

use std::collections::HashMap;

mod properties;
mod registry;

pub use properties::PropertiesFile;
pub(crate) use registry::SourceRegistry;

/// A named lookup for configuration values.
pub trait Source: Send + Sync {
    /// Label associated with this source, for logging and diagnostics.
    ///
    /// Labels must be unique across the sources of one loader.
    fn label(&self) -> &str;

    /// Implementation-defined lookup for the value associated with `key`.
    ///
    /// Returns `None` when this source has no value for the key, letting
    /// the scan fall through to lower-priority sources.
    fn find(&self, key: &str) -> Option<String>;
}

/// A [`Source`] backed by a lookup closure.
pub struct FnSource<F> {
    label: String,
    lookup: F,
}

impl<F> FnSource<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    /// Wraps `lookup` as a source named `label`.
    pub fn new(label: impl Into<String>, lookup: F) -> Self {
        Self {
            label: label.into(),
            lookup,
        }
    }
}

impl<F> Source for FnSource<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn find(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }
}

/// A [`Source`] backed by an owned map of entries.
#[derive(Debug)]
pub struct MapSource {
    label: String,
    entries: HashMap<String, String>,
}

impl MapSource {
    /// Wraps `entries` as a source named `label`.
    pub fn new(label: impl Into<String>, entries: HashMap<String, String>) -> Self {
        Self {
            label: label.into(),
            entries,
        }
    }
}

impl Source for MapSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn find(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// The implicit lowest-priority source every loader carries.
///
/// Resolves nothing; it exists so the scan always terminates on a labelled
/// source and the build log shows where priority bottoms out.
pub(crate) struct RootSource;

impl RootSource {
    pub(crate) const LABEL: &'static str = "ROOT";
}

impl Source for RootSource {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn find(&self, _key: &str) -> Option<String> {
        None
    }
}
