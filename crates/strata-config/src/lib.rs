//! Surgical deep-path overrides for hierarchical configuration.
//!
//! This crate lets individual leaves of a nested configuration tree be
//! addressed and overwritten by a single delimited key, including leaves
//! that live inside arrays:
//! - Key paths such as `nest.eggs.0.weight` or `NEST__EGGS__0__WEIGHT`
//! - Environment variable overrides discovered by delimiter
//! - Case-insensitive keys throughout
//! - Weakly-typed decoding into `serde` structs
//! - Layered loading (defaults → files → env → explicit overrides)
//!
//! # Overview
//!
//! - [`ConfigTree`] - the value tree, lower-cased on construction
//! - [`KeyPath`] - a parsed, delimiter-split key
//! - [`DeepConfig`] - the resolver: lookups, writes, env application, decoding
//! - [`ConfigLoader`] - assembles a [`DeepConfig`] from several sources
//!
//! # Example
//!
//! ```
//! use serde::Deserialize;
//! use strata_config::{ConfigLoader, ENV_DELIMITER};
//!
//! #[derive(Deserialize)]
//! struct Egg {
//!     weight: i32,
//!     some_strings: Vec<String>,
//! }
//!
//! #[derive(Deserialize)]
//! struct Nest {
//!     eggs: Vec<Egg>,
//! }
//!
//! #[derive(Deserialize)]
//! struct Settings {
//!     nest: Nest,
//! }
//!
//! # fn main() -> Result<(), strata_config::ConfigError> {
//! let settings: Settings = ConfigLoader::new()
//!     .with_string(r#"{"nest": {"eggs": [{"weight": 0, "somestrings": ["a", "a"]}]}}"#, "json")?
//!     .with_delimiter(ENV_DELIMITER)
//!     .with_vars(vec![
//!         ("nest__eggs__0__weight".to_string(), "42".to_string()),
//!         ("nest__eggs__0__somestrings__1".to_string(), "zz".to_string()),
//!     ])
//!     .load_into()?;
//!
//! assert_eq!(settings.nest.eggs[0].weight, 42);
//! assert_eq!(settings.nest.eggs[0].some_strings, ["a", "zz"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Path Resolution
//!
//! A key is lower-cased and split on the delimiter. Every segment but the
//! last walks one level: a map is entered by key, an array by decimal index.
//! The last segment names the value to read or replace. Arrays are never
//! grown, and an array directly inside an array cannot be addressed.
//! Failures are logged with `tracing` and reported as [`PathError`] values;
//! they never abort an update.

#![warn(missing_docs)]

mod config;
pub mod decode;
pub mod duration;
mod env;
mod error;
mod loader;
mod path;
mod tree;

pub use config::{DeepConfig, DeepConfigBuilder, EnvReport};
pub use env::{process_vars, EnvScanner};
pub use error::{ConfigError, PathError};
pub use loader::ConfigLoader;
pub use path::{Delimiter, KeyPath, WritePolicy, DEFAULT_DELIMITER, ENV_DELIMITER};
pub use tree::{toml_to_json, ConfigTree};
