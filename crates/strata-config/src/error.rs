//! Configuration error types.
//!
//! Two families live here. [`ConfigError`] is returned by operations that can
//! genuinely fail the caller (reading files, building a [`DeepConfig`](crate::DeepConfig),
//! decoding). [`PathError`] describes why a single path could not be resolved;
//! override application logs it and carries on.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or decoding configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[source] serde_json::Error),

    /// The source format is neither TOML nor JSON.
    #[error("unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The format name or file path that was rejected.
        format: String,
    },

    /// The key delimiter is empty.
    #[error("invalid key delimiter: {reason}")]
    InvalidDelimiter {
        /// Why the delimiter was rejected.
        reason: String,
    },

    /// A configuration source did not produce a map at its root.
    #[error("configuration root must be a map, found {found}")]
    InvalidRoot {
        /// Kind of value found at the root.
        found: &'static str,
    },

    /// The tree could not be decoded into the requested type.
    #[error("failed to decode configuration: {0}")]
    Decode(#[source] serde_json::Error),

    /// A `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a new invalid delimiter error.
    pub fn invalid_delimiter(reason: impl Into<String>) -> Self {
        Self::InvalidDelimiter {
            reason: reason.into(),
        }
    }
}

/// Why a key path could not be resolved against a tree.
///
/// Every variant except [`PathError::EmptyTerminal`] carries `path`, the
/// dotted trace of segments consumed up to and including the failing one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The key ends with the delimiter, or is empty.
    #[error("key `{key}` has an empty terminal segment")]
    EmptyTerminal {
        /// The raw key as supplied.
        key: String,
    },

    /// An intermediate or terminal map key does not exist.
    #[error("no such path exists: {path}")]
    MissingKey {
        /// Trace of consumed segments.
        path: String,
    },

    /// A segment applied to an array is not a non-negative integer.
    #[error("no such path exists, must be an array idx: {path}")]
    NotAnIndex {
        /// Trace of consumed segments.
        path: String,
    },

    /// An array index is past the end of the array.
    #[error("no such path exists: {path} (index {index}, length {len})")]
    IndexOutOfBounds {
        /// Trace of consumed segments.
        path: String,
        /// Requested index.
        index: usize,
        /// Length of the array.
        len: usize,
    },

    /// An intermediate value is a scalar where a map was required.
    #[error("no such path exists: {path}, value is not a map")]
    NotAContainer {
        /// Trace of consumed segments.
        path: String,
    },

    /// The walk would step from one array directly into another.
    #[error("unsupported shape at {path}: arrays of arrays are not addressable")]
    NestedArray {
        /// Trace of consumed segments.
        path: String,
    },
}

impl PathError {
    /// The dotted trace of segments consumed before the failure, if any.
    pub fn trace(&self) -> Option<&str> {
        match self {
            Self::EmptyTerminal { .. } => None,
            Self::MissingKey { path }
            | Self::NotAnIndex { path }
            | Self::IndexOutOfBounds { path, .. }
            | Self::NotAContainer { path }
            | Self::NestedArray { path } => Some(path),
        }
    }
}
