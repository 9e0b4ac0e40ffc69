//! Layered configuration resolution.
//!
//! `strata_config` resolves property keys against an ordered set of
//! *sources* (named string→string lookups), where the source registered
//! last has the highest priority. Keys follow a small grammar:
//! dot-delimited literal parts, `{override}` parts that fall back to the
//! key without them, and `${placeholder}` parts interpolated from other
//! keys. Values are expanded the same way, recursively and cycle-checked,
//! and lookups can be cached under a per-call maximum age.
//!
//! ```rust
//! use std::collections::HashMap;
//! use strata_config::ConfigLoader;
//!
//! # fn run() -> strata_config::ConfigResult<()> {
//! let loader = ConfigLoader::builder()
//!     .add_map("defaults", HashMap::from([
//!         ("persistence.db.host".to_owned(), "localhost".to_owned()),
//!         ("persistence.db.url".to_owned(), "postgres://${persistence.db.host}/app".to_owned()),
//!     ]))
//!     .build()?;
//!
//! let url = loader.get_string("persistence.db.url")?.require()?;
//! assert_eq!(url, "postgres://localhost/app");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

pub mod cache;
mod clock;
mod error;
mod expand;
mod key;
mod loader;
mod source;

pub use clock::{Clock, SystemClock};
pub use error::{ConfigError, ConfigResult, ParserError, SyntaxError};
pub use loader::{Builder, ConfigLoader, ConfigValue, FromConfigString, InvalidBoolean};
pub use source::{FnSource, MapSource, PropertiesFile, Source};
