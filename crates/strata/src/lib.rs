//! # Strata
//!
//! **Surgical deep-path overrides for hierarchical configuration**
//!
//! Strata lets any leaf of a nested configuration tree, including leaves
//! inside arrays, be replaced by a single delimited key:
//!
//! - **Deep paths** – `nest.eggs.0.weight` addresses the weight of the first egg
//! - **Environment overrides** – `NEST__EGGS__0__WEIGHT=42` does the same from the shell
//! - **Case-insensitive** – keys are lower-cased on the way in
//! - **Weak decoding** – `"42"` decodes into an integer field, `"a,b"` into a `Vec`
//! - **Layered loading** – defaults, TOML/JSON files, environment, explicit overrides
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let settings: Settings = ConfigLoader::new()
//!     .with_file("appsettings.json")?
//!     .with_optional_file("appsettings.Test.json")?
//!     .with_delimiter(ENV_DELIMITER)
//!     .with_env()
//!     .load_into()?;
//! ```

#![doc(html_root_url = "https://docs.rs/strata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the configuration core
pub use strata_config as config;

// Re-export logging setup
pub use strata_telemetry as telemetry;

pub mod cli;

/// Strata version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use strata::prelude::*;
///
/// let config = DeepConfig::new(ConfigTree::default());
/// assert_eq!(config.delimiter().as_str(), DEFAULT_DELIMITER);
/// ```
pub mod prelude {
    pub use strata_config::{
        ConfigError, ConfigLoader, ConfigTree, DeepConfig, Delimiter, EnvReport, KeyPath,
        PathError, WritePolicy, DEFAULT_DELIMITER, ENV_DELIMITER,
    };

    pub use strata_telemetry::{init_logging, LogConfig};
}
