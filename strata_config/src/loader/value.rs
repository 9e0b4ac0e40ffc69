//! Lookup results and typed coercion.

use thiserror::Error;

use crate::error::{ConfigError, ConfigResult};

/// The result of a configuration lookup: the key that was asked for and the
/// value it resolved to, if any.
///
/// Instances are cheap to clone and compare; a missing key is an empty
/// value, not an error, until [`ConfigValue::require`] says otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    property_name: String,
    value: Option<T>,
}

impl<T> ConfigValue<T> {
    /// A value for `property_name`, present or not.
    pub fn new(property_name: impl Into<String>, value: Option<T>) -> Self {
        Self {
            property_name: property_name.into(),
            value,
        }
    }

    /// An absent value for `property_name`.
    pub fn empty(property_name: impl Into<String>) -> Self {
        Self::new(property_name, None)
    }

    /// The key this value was looked up under.
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Whether a value was resolved.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Borrows the resolved value.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Consumes this result, yielding the resolved value.
    #[must_use]
    pub fn into_inner(self) -> Option<T> {
        self.value
    }

    /// The resolved value, or `fallback` when absent.
    #[must_use]
    pub fn unwrap_or(self, fallback: T) -> T {
        self.value.unwrap_or(fallback)
    }

    /// The resolved value, or a [`ConfigError::NotConfigured`] naming the
    /// key.
    ///
    /// # Errors
    ///
    /// Fails when no value was resolved.
    pub fn require(self) -> ConfigResult<T> {
        self.value.ok_or(ConfigError::NotConfigured {
            key: self.property_name,
        })
    }
}

/// Coercion hook for typed lookups.
///
/// The loader resolves every key to a string first and then coerces through
/// this trait. Implementations supply the type name used in coercion error
/// messages, so downstream types control how they are reported.
pub trait FromConfigString: Sized {
    /// Error produced when the raw string does not parse.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Name used for this type in coercion error messages.
    const TYPE_NAME: &'static str;

    /// Parses a resolved configuration string.
    ///
    /// # Errors
    ///
    /// Fails when `raw` is not a valid rendering of this type.
    fn from_config_str(raw: &str) -> Result<Self, Self::Err>;
}

/// Failure to read a string as a configuration boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected 'true' or 'false'")]
pub struct InvalidBoolean;

impl FromConfigString for bool {
    type Err = InvalidBoolean;

    const TYPE_NAME: &'static str = "bool";

    /// Accepts `true` and `false` in any casing, nothing else.
    fn from_config_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(InvalidBoolean)
        }
    }
}

macro_rules! from_config_string_via_from_str {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl FromConfigString for $ty {
                type Err = <$ty as std::str::FromStr>::Err;

                const TYPE_NAME: &'static str = $name;

                fn from_config_str(raw: &str) -> Result<Self, Self::Err> {
                    raw.parse()
                }
            }
        )+
    };
}

from_config_string_via_from_str! {
    i32 => "i32",
    i64 => "i64",
    f32 => "f32",
    f64 => "f64",
}
