//! The deep-path resolver.
//!
//! [`DeepConfig`] owns a [`ConfigTree`] and the options that govern how keys
//! are split and how missing structure is treated. Its update and lookup
//! entry points never fail the caller: path problems are logged and reported
//! as data. Only [`DeepConfig::unmarshal`] returns an error.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::decode;
use crate::env::{self, EnvScanner};
use crate::error::{ConfigError, PathError};
use crate::path::{Delimiter, KeyPath, WritePolicy, DEFAULT_DELIMITER};
use crate::tree::ConfigTree;

/// A configuration tree addressable by delimited key paths.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use strata_config::{ConfigTree, DeepConfig};
///
/// let tree = ConfigTree::from_value(json!({"nest": {"eggs": [{"weight": 0}]}})).unwrap();
/// let mut config = DeepConfig::builder(tree).with_delimiter("__").build().unwrap();
///
/// let report = config.update_from_vars(vec![
///     ("nest__eggs__0__weight".to_string(), "42".to_string()),
///     ("HOME".to_string(), "/root".to_string()),
/// ]);
///
/// assert_eq!(report.applied, ["nest__eggs__0__weight"]);
/// assert_eq!(config.find("nest__eggs__0__weight"), Some(&json!("42")));
/// ```
#[derive(Debug, Clone)]
pub struct DeepConfig {
    tree: ConfigTree,
    scanner: EnvScanner,
    policy: WritePolicy,
}

/// Outcome of applying environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvReport {
    /// Variable names (prefix stripped) that were written.
    pub applied: Vec<String>,
    /// Variable names that could not be applied, with the reason.
    pub skipped: Vec<(String, PathError)>,
}

impl EnvReport {
    /// Whether every candidate was applied.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl DeepConfig {
    /// Wrap a tree with the default options: `.` delimiter, no environment
    /// prefix, [`WritePolicy::CreateMissing`].
    pub fn new(tree: impl Into<ConfigTree>) -> Self {
        Self {
            tree: tree.into(),
            scanner: EnvScanner::new(Delimiter::default()),
            policy: WritePolicy::default(),
        }
    }

    /// Start building a resolver around `tree`.
    pub fn builder(tree: impl Into<ConfigTree>) -> DeepConfigBuilder {
        DeepConfigBuilder::new(tree.into())
    }

    /// Apply every delimiter-bearing variable of the process environment.
    pub fn update_from_env(&mut self) -> EnvReport {
        self.update_from_vars(env::process_vars())
    }

    /// Apply every delimiter-bearing pair from `vars` as a surgical write.
    ///
    /// Values are written as strings; [`unmarshal`](Self::unmarshal) coerces
    /// them to the target field types. Failures are logged and collected in
    /// the report, never returned as errors.
    pub fn update_from_vars<I>(&mut self, vars: I) -> EnvReport
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let candidates = self.scanner.candidates(vars);
        let mut report = EnvReport::default();

        for (key, value) in candidates {
            match self.try_update_deep_path(&key, Value::String(value)) {
                Ok(()) => {
                    debug!(key = %key, "applied environment override");
                    report.applied.push(key);
                }
                Err(err) => {
                    log_path_error(&key, &err);
                    report.skipped.push((key, err));
                }
            }
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "environment overrides processed"
        );
        report
    }

    /// Read the value at `key`, or `None` if the path does not resolve.
    ///
    /// A stored `null` is returned as `Some(&Value::Null)`; use
    /// [`lookup`](Self::lookup) to learn why a path did not resolve.
    pub fn find(&self, key: &str) -> Option<&Value> {
        self.lookup(key)
            .map_err(|err| log_path_error(key, &err))
            .ok()
    }

    /// Read the value at `key`, reporting why resolution failed.
    pub fn lookup(&self, key: &str) -> Result<&Value, PathError> {
        let path = KeyPath::parse(key, self.scanner.delimiter())?;
        self.tree.get(&path)
    }

    /// Overwrite the value at `key`; failures are logged and ignored.
    pub fn update_deep_path(&mut self, key: &str, value: impl Into<Value>) {
        if let Err(err) = self.try_update_deep_path(key, value) {
            log_path_error(key, &err);
        }
    }

    /// Overwrite the value at `key` under the configured [`WritePolicy`].
    pub fn try_update_deep_path(&mut self, key: &str, value: impl Into<Value>) -> Result<(), PathError> {
        let path = KeyPath::parse(key, self.scanner.delimiter())?;
        self.tree.set(&path, value.into(), self.policy)
    }

    /// Decode the tree into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] when the tree cannot take the shape
    /// of `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        decode::from_tree(&self.tree)
    }

    /// The underlying tree.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Consume the resolver, returning its tree.
    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// The key delimiter.
    pub fn delimiter(&self) -> &Delimiter {
        self.scanner.delimiter()
    }

    /// The environment prefix as matched, including its trailing `_`.
    pub fn env_prefix(&self) -> Option<&str> {
        self.scanner.prefix()
    }

    /// The write policy.
    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }
}

fn log_path_error(key: &str, err: &PathError) {
    match err {
        PathError::EmptyTerminal { .. } => debug!(key = %key, "ignoring key with empty terminal segment"),
        _ => error!(key = %key, error = %err, "no such path"),
    }
}

/// Builder for [`DeepConfig`].
#[derive(Debug)]
pub struct DeepConfigBuilder {
    tree: ConfigTree,
    delimiter: String,
    env_prefix: Option<String>,
    policy: WritePolicy,
}

impl DeepConfigBuilder {
    fn new(tree: ConfigTree) -> Self {
        Self {
            tree,
            delimiter: DEFAULT_DELIMITER.to_string(),
            env_prefix: None,
            policy: WritePolicy::default(),
        }
    }

    /// Strip `"<prefix>_"` from environment variable names before matching.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Override the key delimiter. Validated by [`build`](Self::build).
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    /// Choose how writes treat missing structure.
    #[must_use]
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelimiter`] if the delimiter is empty.
    pub fn build(self) -> Result<DeepConfig, ConfigError> {
        let delimiter = Delimiter::new(self.delimiter)?;
        let mut scanner = EnvScanner::new(delimiter);
        if let Some(prefix) = &self.env_prefix {
            scanner = scanner.with_prefix(prefix);
        }
        Ok(DeepConfig {
            tree: self.tree,
            scanner,
            policy: self.policy,
        })
    }
}
