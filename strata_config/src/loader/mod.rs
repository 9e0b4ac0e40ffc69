//! The configuration loader: priority lookup, placeholder expansion,
//! override fallback, and typed access.
//!
//! A loader scans its sources in reverse registration order, so the source
//! added last wins. Keys may carry `{override}` parts, which fall back to
//! the key without the override when the specific form resolves to nothing,
//! and `${placeholder}` parts, which are expanded against the loader before
//! the key is resolved. Values are expanded the same way, recursively, with
//! a visited set bounding the recursion.

use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{AgeAwareCache, MaxAgeCache};
use crate::error::{ConfigError, ConfigResult};
use crate::expand::find_leaf_regions;
use crate::key;
use crate::source::SourceRegistry;

mod builder;
mod value;

pub use builder::Builder;
pub use value::{ConfigValue, FromConfigString, InvalidBoolean};

/// Resolves configuration keys against a prioritised set of sources.
///
/// Build one with [`ConfigLoader::builder`]; sources are consulted in
/// reverse registration order. The loader is immutable and safe to share
/// across threads; with caching enabled, the cache is its only mutable
/// state.
#[derive(Debug)]
pub struct ConfigLoader {
    registry: SourceRegistry,
    cache: Option<MaxAgeCache<String, String>>,
}

impl ConfigLoader {
    /// Starts a builder for defining sources, prioritised by reverse
    /// registration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use strata_config::ConfigLoader;
    ///
    /// # fn run() -> strata_config::ConfigResult<()> {
    /// let loader = ConfigLoader::builder()
    ///     .add_map("defaults", HashMap::from([
    ///         ("greeting.for.world".to_owned(), "hello".to_owned()),
    ///     ]))
    ///     .add_lookup("process environment", |key| std::env::var(key).ok())
    ///     .build()?;
    ///
    /// let greeting = loader.get_string("greeting.for.{world}")?;
    /// assert_eq!(greeting.get().map(String::as_str), Some("hello"));
    /// # Ok(())
    /// # }
    /// # run().unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub(crate) fn new(
        registry: SourceRegistry,
        cache: Option<MaxAgeCache<String, String>>,
    ) -> Self {
        Self { registry, cache }
    }

    /// Resolves `key` to a string, bypassing any cached entry.
    ///
    /// Equivalent to [`ConfigLoader::get_string_no_older_than`] with a zero
    /// age: a fresh lookup every call, though the result is still stored
    /// for callers that do tolerate cached values.
    ///
    /// # Errors
    ///
    /// Fails on an invalid key, or when expansion revisits a key already
    /// being expanded.
    pub fn get_string(&self, key: &str) -> ConfigResult<ConfigValue<String>> {
        self.get_string_ms(key, 0)
    }

    /// Resolves `key` to a string, accepting a cached entry no older than
    /// `max_age`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid key, or when expansion revisits a key already
    /// being expanded.
    pub fn get_string_no_older_than(
        &self,
        key: &str,
        max_age: Duration,
    ) -> ConfigResult<ConfigValue<String>> {
        let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        self.get_string_ms(key, max_age_ms)
    }

    fn get_string_ms(&self, key: &str, max_age_ms: u64) -> ConfigResult<ConfigValue<String>> {
        let value = match &self.cache {
            Some(cache) => {
                // The fallback cannot return a Result through the cache;
                // park the failure and rethrow it after the call.
                let mut failure = None;
                let value = cache.get(&key.to_owned(), max_age_ms, &mut || {
                    match self.resolve_raw(key) {
                        Ok(resolved) => resolved,
                        Err(error) => {
                            failure = Some(error);
                            None
                        }
                    }
                });
                if let Some(error) = failure {
                    return Err(error);
                }
                value
            }
            None => self.resolve_raw(key)?,
        };

        Ok(ConfigValue::new(key, value))
    }

    /// Resolves `key` as a boolean: `true` or `false`, case-insensitive.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_string`], plus a coercion failure when the
    /// resolved value is neither `true` nor `false`.
    pub fn get_bool(&self, key: &str) -> ConfigResult<ConfigValue<bool>> {
        self.get_as(key)
    }

    /// [`ConfigLoader::get_bool`] accepting a cached entry no older than
    /// `max_age`.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_bool`].
    pub fn get_bool_no_older_than(
        &self,
        key: &str,
        max_age: Duration,
    ) -> ConfigResult<ConfigValue<bool>> {
        self.get_as_no_older_than(key, max_age)
    }

    /// Resolves `key` as a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_string`], plus a coercion failure when the
    /// resolved value does not parse.
    pub fn get_i32(&self, key: &str) -> ConfigResult<ConfigValue<i32>> {
        self.get_as(key)
    }

    /// [`ConfigLoader::get_i32`] accepting a cached entry no older than
    /// `max_age`.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_i32`].
    pub fn get_i32_no_older_than(
        &self,
        key: &str,
        max_age: Duration,
    ) -> ConfigResult<ConfigValue<i32>> {
        self.get_as_no_older_than(key, max_age)
    }

    /// Resolves `key` as a signed 64-bit integer.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_string`], plus a coercion failure when the
    /// resolved value does not parse.
    pub fn get_i64(&self, key: &str) -> ConfigResult<ConfigValue<i64>> {
        self.get_as(key)
    }

    /// [`ConfigLoader::get_i64`] accepting a cached entry no older than
    /// `max_age`.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_i64`].
    pub fn get_i64_no_older_than(
        &self,
        key: &str,
        max_age: Duration,
    ) -> ConfigResult<ConfigValue<i64>> {
        self.get_as_no_older_than(key, max_age)
    }

    /// Resolves `key` as a 32-bit float.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_string`], plus a coercion failure when the
    /// resolved value does not parse.
    pub fn get_f32(&self, key: &str) -> ConfigResult<ConfigValue<f32>> {
        self.get_as(key)
    }

    /// [`ConfigLoader::get_f32`] accepting a cached entry no older than
    /// `max_age`.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_f32`].
    pub fn get_f32_no_older_than(
        &self,
        key: &str,
        max_age: Duration,
    ) -> ConfigResult<ConfigValue<f32>> {
        self.get_as_no_older_than(key, max_age)
    }

    /// Resolves `key` as a 64-bit float.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_string`], plus a coercion failure when the
    /// resolved value does not parse.
    pub fn get_f64(&self, key: &str) -> ConfigResult<ConfigValue<f64>> {
        self.get_as(key)
    }

    /// [`ConfigLoader::get_f64`] accepting a cached entry no older than
    /// `max_age`.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_f64`].
    pub fn get_f64_no_older_than(
        &self,
        key: &str,
        max_age: Duration,
    ) -> ConfigResult<ConfigValue<f64>> {
        self.get_as_no_older_than(key, max_age)
    }

    /// Resolves `key` and coerces the value through [`FromConfigString`].
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_string`], plus a coercion failure naming
    /// `T::TYPE_NAME` when the resolved value does not parse.
    pub fn get_as<T: FromConfigString>(&self, key: &str) -> ConfigResult<ConfigValue<T>> {
        self.get_as_ms(key, 0)
    }

    /// [`ConfigLoader::get_as`] accepting a cached entry no older than
    /// `max_age`.
    ///
    /// # Errors
    ///
    /// As [`ConfigLoader::get_as`].
    pub fn get_as_no_older_than<T: FromConfigString>(
        &self,
        key: &str,
        max_age: Duration,
    ) -> ConfigResult<ConfigValue<T>> {
        let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        self.get_as_ms(key, max_age_ms)
    }

    fn get_as_ms<T: FromConfigString>(
        &self,
        key: &str,
        max_age_ms: u64,
    ) -> ConfigResult<ConfigValue<T>> {
        let resolved = self.get_string_ms(key, max_age_ms)?;
        match resolved.into_inner() {
            Some(raw) => {
                let parsed = T::from_config_str(&raw).map_err(|source| ConfigError::Coercion {
                    key: key.to_owned(),
                    type_name: T::TYPE_NAME,
                    source: Box::new(source),
                })?;
                Ok(ConfigValue::new(key, Some(parsed)))
            }
            None => Ok(ConfigValue::empty(key)),
        }
    }

    /// Root of one resolution: seeds the visited set with the requested key.
    fn resolve_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        let mut visited = HashSet::new();
        visited.insert(key.to_owned());
        self.resolve_visited(key, &visited)
    }

    fn resolve_visited(
        &self,
        key: &str,
        visited: &HashSet<String>,
    ) -> ConfigResult<Option<String>> {
        let expanded_key = self.expand_placeholders(key, visited)?;
        self.lookup_with_overrides(&expanded_key, visited)
    }

    /// Substitutes every leaf `${…}` region of `text` with its resolved
    /// value, innermost first.
    ///
    /// Each region expands under its own copy of the visited set, so
    /// sibling regions may legitimately resolve through the same keys; a
    /// key recurring on one branch is an expansion loop. A region whose key
    /// resolves to nothing is written back verbatim for traceability.
    fn expand_placeholders(
        &self,
        text: &str,
        visited: &HashSet<String>,
    ) -> ConfigResult<String> {
        let regions = find_leaf_regions(text);
        if regions.is_empty() {
            return Ok(text.to_owned());
        }

        // Substitute back-to-front so earlier region indices stay valid.
        let mut expanded: Vec<char> = text.chars().collect();
        for region in regions.iter().rev() {
            let mut branch_visited = visited.clone();
            if !branch_visited.insert(region.key.clone()) {
                return Err(ConfigError::ExpansionLoop);
            }

            let resolved = self.resolve_visited(&region.key, &branch_visited)?;
            let replacement = resolved.as_deref().unwrap_or(&region.placeholder);
            expanded.splice(region.start..=region.end, replacement.chars());
        }

        Ok(expanded.into_iter().collect())
    }

    /// Tries the *specific* form of `key` against the sources, then the
    /// *generic* form when it differs.
    fn lookup_with_overrides(
        &self,
        key: &str,
        visited: &HashSet<String>,
    ) -> ConfigResult<Option<String>> {
        let parsed = key::parse(key)?;

        let specific = parsed.normalize(true);
        if let Some(value) = self.scan_sources(&specific, visited)? {
            return Ok(Some(value));
        }

        let generic = parsed.normalize(false);
        if generic != specific {
            return self.scan_sources(&generic, visited);
        }
        Ok(None)
    }

    /// Scans the registry for `key`, highest priority first, and expands
    /// placeholders in the value of the first hit.
    fn scan_sources(
        &self,
        key: &str,
        visited: &HashSet<String>,
    ) -> ConfigResult<Option<String>> {
        match self.registry.find(key) {
            Some((value, label)) => {
                tracing::info!("Key [{key}] was found in '{label}'");
                Ok(Some(self.expand_placeholders(&value, visited)?))
            }
            None => {
                tracing::info!("Key [{key}] could not be found");
                Ok(None)
            }
        }
    }
}
