//! Logging setup for Strata tools.
//!
//! The library crates only emit `tracing` events. Binaries call
//! [`init_logging`] once at startup to install a subscriber that writes
//! them to stderr, either as JSON lines or in a human-readable layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(key = "nest__eggs__0__weight", "applied environment override");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
