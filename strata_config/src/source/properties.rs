//! `.properties` file sources.
//!
//! A [`PropertiesFile`] names a flat key-value file to register as a source.
//! Resource files resolve against a resource root directory; other files
//! resolve against the process working directory. The file syntax follows
//! the customary properties format: one `key=value` or `key:value` pair per
//! line, `#` or `!` comments, backslash line continuations, and
//! backslash escapes in keys and values.

use std::collections::HashMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::{ConfigError, ConfigResult};

use super::MapSource;

/// Default directory searched for resource properties files.
const DEFAULT_RESOURCE_ROOT: &str = "resources";

/// Where a properties file is looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileLocation {
    /// Under the resource root directory.
    Resource,
    /// Under the process working directory.
    WorkingDir,
}

/// A `.properties` file to register as a configuration source.
///
/// The registered path doubles as the source label. A *required* file that
/// cannot be found fails the build; an optional one is skipped with a
/// warning.
#[derive(Debug, Clone)]
pub struct PropertiesFile {
    path: Utf8PathBuf,
    location: FileLocation,
    required: bool,
    resource_root: Utf8PathBuf,
}

impl PropertiesFile {
    /// A required file under the resource root (`resources/` by default).
    pub fn resource(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            location: FileLocation::Resource,
            required: true,
            resource_root: Utf8PathBuf::from(DEFAULT_RESOURCE_ROOT),
        }
    }

    /// A required file under the process working directory.
    pub fn working_dir(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            location: FileLocation::WorkingDir,
            required: true,
            resource_root: Utf8PathBuf::from(DEFAULT_RESOURCE_ROOT),
        }
    }

    /// Marks the file as optional: when absent it is skipped instead of
    /// failing the build.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Overrides the directory resource files resolve against.
    #[must_use]
    pub fn resource_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.resource_root = root.into();
        self
    }

    /// The registered path, used as the source label.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads the file into a source, or `None` when an optional file is
    /// absent.
    ///
    /// Called once at loader build time; absence of a required file and IO
    /// failures are fatal to the build.
    pub(crate) fn load(&self) -> ConfigResult<Option<MapSource>> {
        let full_path = match self.location {
            FileLocation::Resource => self.resource_root.join(&self.path),
            FileLocation::WorkingDir => working_dir()
                .map_err(|source| self.io_error(source))?
                .join(&self.path),
        };

        if !full_path.is_file() {
            if self.required {
                return Err(ConfigError::MissingPropertiesFile {
                    path: self.path.to_string(),
                });
            }
            tracing::warn!("Optional .properties file not found, skipping: {}", self.path);
            return Ok(None);
        }

        let contents =
            fs::read_to_string(&full_path).map_err(|source| self.io_error(source))?;
        Ok(Some(MapSource::new(
            self.path.as_str(),
            parse_properties(&contents),
        )))
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::PropertiesFileIo {
            path: self.path.to_string(),
            source,
        }
    }
}

fn working_dir() -> std::io::Result<Utf8PathBuf> {
    let dir = std::env::current_dir()?;
    Utf8PathBuf::from_path_buf(dir)
        .map_err(|dir| std::io::Error::other(format!("non UTF-8 working directory: {}", dir.display())))
}

/// Parses properties text into a flat map.
///
/// Later occurrences of a key overwrite earlier ones, matching the load
/// order of the customary format.
pub(crate) fn parse_properties(contents: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let mut lines = contents.lines();

    while let Some(line) = lines.next() {
        let mut logical = line.to_owned();

        // A line ending in an odd number of backslashes continues on the
        // next physical line, with that line's leading whitespace dropped.
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let trimmed = logical.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let (key, value) = split_pair(trimmed);
        entries.insert(key, value);
    }

    entries
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped `=`, `:`, or whitespace
/// run (optionally followed by one `=` or `:`), then unescapes both halves.
fn split_pair(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();

    let mut split = 0;
    while split < chars.len() {
        match chars[split] {
            '\\' => split += 2,
            '=' | ':' => break,
            c if c.is_whitespace() => break,
            _ => split += 1,
        }
    }
    let key_end = split.min(chars.len());

    let mut value_start = key_end;
    while value_start < chars.len() && chars[value_start].is_whitespace() {
        value_start += 1;
    }
    if value_start < chars.len() && matches!(chars[value_start], '=' | ':') {
        value_start += 1;
        while value_start < chars.len() && chars[value_start].is_whitespace() {
            value_start += 1;
        }
    }

    let key: String = chars[..key_end].iter().collect();
    let value: String = chars[value_start..].iter().collect();
    (unescape(&key), unescape(&value))
}

/// Resolves the customary backslash escapes, including `\uXXXX`.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(current) = chars.next() {
        if current != '\\' {
            out.push(current);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let digits: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        // Malformed escape; keep the text readable rather
                        // than failing the whole file.
                        out.push('u');
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
