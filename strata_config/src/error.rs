//! Error types produced by the configuration loader.
//!
//! Two kinds of failure exist: [`ConfigError`] for user-facing configuration
//! problems (missing required files, duplicate source labels, expansion
//! loops, unconfigured required keys, coercion failures) and [`ParserError`]
//! for property-key syntax violations, which always carry a character offset
//! and an inner cause.
//!
//! The display strings of these errors are stable and relied upon by
//! downstream test suites; treat them as part of the crate's ABI.

use thiserror::Error;

/// Convenience alias for results carrying a [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building a loader or resolving a key.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A placeholder chain revisited a key it is already expanding.
    #[error("Property Expansion Loop")]
    ExpansionLoop,

    /// A resolved value could not be coerced to the requested type.
    #[error("Could not parse '{key}' value as type '{type_name}'")]
    Coercion {
        /// Key whose value failed to coerce.
        key: String,
        /// Name of the target type, as reported by the coercion hook.
        type_name: &'static str,
        /// Underlying parse failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required properties file was not found at its resolved path.
    #[error("Missing required .properties file for configuration: {path}")]
    MissingPropertiesFile {
        /// Path the file was expected at, as registered.
        path: String,
    },

    /// A properties file exists but could not be read.
    #[error("Failed to load .properties file for configuration: {path}")]
    PropertiesFileIo {
        /// Path the file was read from, as registered.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// Two retained sources share a label.
    #[error("Duplicate source label '{label}' found")]
    DuplicateSourceLabel {
        /// The offending label.
        label: String,
    },

    /// A required key resolved to nothing.
    #[error("Key for [{key}] not configured")]
    NotConfigured {
        /// The unresolved property key.
        key: String,
    },

    /// A property key failed to parse.
    #[error(transparent)]
    Parser(#[from] ParserError),
}

/// Errors raised by the property-key parser.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParserError {
    /// The key violated the property-key grammar.
    ///
    /// `index` is the character offset the scanner had reached when the
    /// violation was detected; the precise violation is the [`SyntaxError`]
    /// cause.
    #[error("Could not parse property key, error at index {index}")]
    Syntax {
        /// Character offset of the violation within the key.
        index: usize,
        /// The specific grammar violation.
        #[source]
        cause: SyntaxError,
    },

    /// The scanner failed to make progress between two iterations.
    ///
    /// This indicates a defect in the parser itself, never invalid input.
    #[error("Parser logic error, infinite loop detected")]
    InfiniteLoop,
}

impl ParserError {
    /// Character offset of a syntax violation, if this is one.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Syntax { index, .. } => Some(*index),
            Self::InfiniteLoop => None,
        }
    }
}

/// Grammar violations detected while scanning a property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// A `$` not followed by `{`.
    #[error("Unexpected '$', placeholders require brackets")]
    BarePlaceholder,

    /// A `}` with no override or placeholder open.
    #[error("Unexpected '}}'")]
    UnexpectedClosingBrace,

    /// A `.` terminating an empty part.
    #[error("Unexpected end of property part")]
    UnexpectedPartEnd,

    /// A `.` encountered outside a literal part.
    #[error("Unexpected start of property part")]
    UnexpectedPartStart,

    /// A part closed while spanning zero characters.
    #[error("Property part cannot be blank")]
    BlankPart,

    /// The key ended with an override or placeholder still open.
    #[error("Unexpected end of property part, expected '}}'")]
    MissingClosingBrace,

    /// A character outside the property-key alphabet.
    #[error("Unsupported character '{0}' in property key")]
    UnsupportedCharacter(char),

    /// A hyphen not flanked by alphanumerics.
    #[error("Unexpected '{0}', illegal use of hyphen")]
    IllegalHyphen(char),

    /// An underscore not flanked by alphanumerics.
    #[error("Unexpected '{0}', illegal use of underscore")]
    IllegalUnderscore(char),
}
