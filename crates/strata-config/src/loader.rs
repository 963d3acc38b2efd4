//! Layered configuration loading.
//!
//! [`ConfigLoader`] assembles a [`ConfigTree`] from serialized defaults,
//! TOML or JSON files and inline strings, then hands it to a [`DeepConfig`]
//! and applies environment overrides followed by explicit overrides.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::DeepConfig;
use crate::env;
use crate::error::ConfigError;
use crate::path::{WritePolicy, DEFAULT_DELIMITER};
use crate::tree::ConfigTree;

/// Where environment overrides come from at load time.
#[derive(Debug, Default)]
enum EnvSource {
    #[default]
    Disabled,
    Process,
    Vars(Vec<(String, String)>),
}

/// Configuration loader with a layered approach.
///
/// Sources are deep-merged in the order they are added: maps merge key by
/// key, any other value replaces what was there. At [`load`](Self::load)
/// time the merged tree receives, in order:
/// 1. environment overrides (if enabled)
/// 2. explicit overrides from [`with_override`](Self::with_override)
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use strata_config::ConfigLoader;
///
/// # fn main() -> Result<(), strata_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_string(r#"{"server": {"port": 8080, "host": "localhost"}}"#, "json")?
///     .with_string("[server]\nport = 9090", "toml")?
///     .with_delimiter("__")
///     .with_vars(vec![("server__host".to_string(), "0.0.0.0".to_string())])
///     .load()?;
///
/// assert_eq!(config.find("server__port"), Some(&json!(9090)));
/// assert_eq!(config.find("server__host"), Some(&json!("0.0.0.0")));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    tree: ConfigTree,
    delimiter: String,
    env_prefix: Option<String>,
    policy: WritePolicy,
    env: EnvSource,
    overrides: Vec<(String, Value)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader with an empty tree and the `.` delimiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: ConfigTree::default(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            env_prefix: None,
            policy: WritePolicy::default(),
            env: EnvSource::Disabled,
            overrides: Vec::new(),
        }
    }

    /// Merge the serialized form of `defaults` into the tree.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `defaults` does not serialize to a map.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Serialize;
    /// use serde_json::json;
    /// use strata_config::ConfigLoader;
    ///
    /// #[derive(Serialize)]
    /// struct Defaults {
    ///     retries: u32,
    ///     tags: Vec<String>,
    /// }
    ///
    /// let config = ConfigLoader::new()
    ///     .with_defaults(&Defaults { retries: 3, tags: vec!["a".into()] })
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.find("tags.0"), Some(&json!("a")));
    /// ```
    pub fn with_defaults<T: Serialize + ?Sized>(mut self, defaults: &T) -> Result<Self, ConfigError> {
        self.tree.merge(ConfigTree::from_serialize(defaults)?);
        Ok(self)
    }

    /// Merge a configuration file into the tree.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The extension is not recognised
    /// - The content is not valid TOML/JSON or its root is not a map
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let layer = Self::parse_file(&content, path)?;
        debug!(path = %path.display(), keys = layer.as_map().len(), "merged configuration file");
        self.tree.merge(layer);

        Ok(self)
    }

    /// Merge a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            debug!(path = %path.as_ref().display(), "optional configuration file not present");
            Ok(self)
        }
    }

    /// Merge configuration content given as a string.
    ///
    /// `format` is `"toml"` or `"json"`, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer = Self::parse(content, &format.to_lowercase())
            .ok_or_else(|| ConfigError::unsupported_format(format))??;
        self.tree.merge(layer);
        Ok(self)
    }

    /// Set the key delimiter. An empty delimiter fails at [`load`](Self::load).
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    /// Strip `"<prefix>_"` from environment variable names.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Choose how overrides treat missing structure.
    #[must_use]
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Apply the process environment at load time.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.env = EnvSource::Process;
        self
    }

    /// Apply the given variables at load time instead of the process
    /// environment.
    #[must_use]
    pub fn with_vars<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env = EnvSource::Vars(vars.into_iter().collect());
        self
    }

    /// Load a `.env` file from the working directory or its parents into the
    /// process environment.
    ///
    /// A missing file is not an error. Only takes effect on the tree together
    /// with [`with_env`](Self::with_env).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(err) if err.not_found() => debug!("no .env file found"),
            Err(err) => return Err(err.into()),
        }
        Ok(self)
    }

    /// Write `value` at `key` after environment overrides are applied.
    #[must_use]
    pub fn with_override(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Build the [`DeepConfig`] and apply overrides.
    ///
    /// Individual overrides that cannot be applied are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelimiter`] if the delimiter is empty.
    pub fn load(self) -> Result<DeepConfig, ConfigError> {
        let mut builder = DeepConfig::builder(self.tree)
            .with_delimiter(&self.delimiter)
            .with_write_policy(self.policy);
        if let Some(prefix) = &self.env_prefix {
            builder = builder.with_env_prefix(prefix);
        }
        let mut config = builder.build()?;

        match self.env {
            EnvSource::Disabled => {}
            EnvSource::Process => {
                config.update_from_vars(env::process_vars());
            }
            EnvSource::Vars(vars) => {
                config.update_from_vars(vars);
            }
        }

        for (key, value) in self.overrides {
            config.update_deep_path(&key, value);
        }

        Ok(config)
    }

    /// Load and decode into `T`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if loading fails or the tree cannot be decoded.
    pub fn load_into<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        self.load()?.unmarshal()
    }

    // Parse a file based on its extension
    fn parse_file(content: &str, path: &Path) -> Result<ConfigTree, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        Self::parse(content, &extension)
            .unwrap_or_else(|| Err(ConfigError::unsupported_format(path.display().to_string())))
    }

    // None when the format is not recognised
    fn parse(content: &str, format: &str) -> Option<Result<ConfigTree, ConfigError>> {
        match format {
            "toml" => Some(
                toml::from_str::<toml::Value>(content)
                    .map_err(ConfigError::from)
                    .and_then(ConfigTree::try_from),
            ),
            "json" => Some(
                serde_json::from_str::<Value>(content)
                    .map_err(ConfigError::JsonError)
                    .and_then(ConfigTree::from_value),
            ),
            _ => None,
        }
    }
}
