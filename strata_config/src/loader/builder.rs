//! Builder assembling a [`ConfigLoader`] from registered sources.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cache::MaxAgeCache;
use crate::clock::{Clock, SystemClock};
use crate::error::{ConfigError, ConfigResult};
use crate::source::{FnSource, MapSource, PropertiesFile, RootSource, Source, SourceRegistry};

use super::ConfigLoader;

/// A deferred source factory: runs once at build time against a loader over
/// the non-deferred sources, returning `None` to register nothing.
type SourceFactory = Box<dyn FnOnce(&ConfigLoader) -> Option<Box<dyn Source>>>;

enum Registration {
    Ready(Arc<dyn Source>),
    File(PropertiesFile),
    Deferred(SourceFactory),
}

/// Builder for [`ConfigLoader`].
///
/// Sources are prioritised by reverse registration order: the source added
/// last is consulted first, and an implicit ROOT source sits beneath them
/// all. Example:
///
/// ```rust
/// use strata_config::ConfigLoader;
///
/// # fn run() -> strata_config::ConfigResult<()> {
/// let loader = ConfigLoader::builder()
///     .add_lookup("process environment", |key| std::env::var(key).ok())
///     .enable_cache()
///     .build()?;
/// # let _ = loader;
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[must_use]
pub struct Builder {
    registrations: Vec<Registration>,
    cache_enabled: bool,
}

impl Builder {
    pub(crate) fn new() -> Self {
        Self {
            registrations: vec![Registration::Ready(Arc::new(RootSource))],
            cache_enabled: false,
        }
    }

    /// Registers a [`Source`] implementation.
    pub fn add_source(mut self, source: impl Source + 'static) -> Self {
        self.registrations
            .push(Registration::Ready(Arc::new(source)));
        self
    }

    /// Registers a lookup closure as a source named `label`.
    pub fn add_lookup<F>(self, label: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.add_source(FnSource::new(label, lookup))
    }

    /// Registers a map of entries as a source named `label`.
    pub fn add_map(self, label: impl Into<String>, entries: HashMap<String, String>) -> Self {
        self.add_source(MapSource::new(label, entries))
    }

    /// Registers a `.properties` file source.
    ///
    /// The file is read at build time; a required file that cannot be found
    /// fails the build.
    pub fn add_properties_file(mut self, file: PropertiesFile) -> Self {
        self.registrations.push(Registration::File(file));
        self
    }

    /// Registers a deferred source.
    ///
    /// The factory runs once during [`Builder::build`], against a loader
    /// over the non-deferred sources only, and may return `None` to
    /// register nothing. Only one level of deferral is supported: a
    /// deferred source never observes another deferred source.
    pub fn defer<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&ConfigLoader) -> Option<Box<dyn Source>> + 'static,
    {
        self.registrations
            .push(Registration::Deferred(Box::new(factory)));
        self
    }

    /// Registers a deferred lookup closure as a source named `label`.
    ///
    /// Convenience over [`Builder::defer`] for factories producing a plain
    /// lookup function.
    pub fn defer_lookup<Factory, Lookup>(
        self,
        label: impl Into<String>,
        factory: Factory,
    ) -> Self
    where
        Factory: FnOnce(&ConfigLoader) -> Option<Lookup> + 'static,
        Lookup: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        let label = label.into();
        self.defer(move |loader| {
            factory(loader).map(|lookup| Box::new(FnSource::new(label, lookup)) as Box<dyn Source>)
        })
    }

    /// Enables the lookup cache of the built loader.
    pub fn enable_cache(mut self) -> Self {
        self.cache_enabled = true;
        self
    }

    /// Builds the loader against the system clock.
    ///
    /// # Errors
    ///
    /// Fails when a required properties file is missing or unreadable, or
    /// when two retained sources share a label.
    pub fn build(self) -> ConfigResult<ConfigLoader> {
        self.build_with_clock(Arc::new(SystemClock))
    }

    /// Builds the loader against the given clock.
    ///
    /// Properties files are read first; a transient loader over every
    /// non-deferred source then feeds each deferred factory; finally label
    /// uniqueness is enforced over the retained sources.
    ///
    /// # Errors
    ///
    /// Fails when a required properties file is missing or unreadable, or
    /// when two retained sources share a label.
    pub fn build_with_clock(self, clock: Arc<dyn Clock>) -> ConfigResult<ConfigLoader> {
        enum Slot {
            Ready(Arc<dyn Source>),
            Deferred(SourceFactory),
        }

        let mut slots = Vec::with_capacity(self.registrations.len());
        for registration in self.registrations {
            match registration {
                Registration::Ready(source) => slots.push(Slot::Ready(source)),
                Registration::File(file) => {
                    if let Some(source) = file.load()? {
                        slots.push(Slot::Ready(Arc::new(source)));
                    }
                }
                Registration::Deferred(factory) => slots.push(Slot::Deferred(factory)),
            }
        }

        let static_sources: Vec<Arc<dyn Source>> = slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Ready(source) => Some(Arc::clone(source)),
                Slot::Deferred(_) => None,
            })
            .collect();
        let first_pass = ConfigLoader::new(SourceRegistry::new(static_sources), None);

        let mut sources: Vec<Arc<dyn Source>> = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Ready(source) => sources.push(source),
                Slot::Deferred(factory) => {
                    if let Some(source) = factory(&first_pass) {
                        sources.push(Arc::from(source));
                    }
                }
            }
        }

        let mut labels = HashSet::new();
        for source in &sources {
            if !labels.insert(source.label().to_owned()) {
                return Err(ConfigError::DuplicateSourceLabel {
                    label: source.label().to_owned(),
                });
            }
        }

        let registry = SourceRegistry::new(sources);
        tracing::info!(
            "Building ConfigLoader with the following sources (in descending order of priority): [{}]",
            registry.labels().collect::<Vec<_>>().join(", ")
        );

        let cache = self
            .cache_enabled
            .then(|| MaxAgeCache::with_clock(clock));
        Ok(ConfigLoader::new(registry, cache))
    }
}
