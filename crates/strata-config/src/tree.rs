//! The configuration value tree.
//!
//! [`ConfigTree`] owns the root map. Every constructor lower-cases map keys
//! recursively, so the tree can be addressed by the lower-cased segments a
//! [`KeyPath`] produces.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, PathError};
use crate::path::{self, KeyPath, WritePolicy};

/// A mutable tree of maps, arrays and scalars keyed by lower-case strings.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use strata_config::{ConfigTree, Delimiter, KeyPath, WritePolicy};
///
/// let mut tree = ConfigTree::from_value(json!({"Nest": {"Eggs": [{"Weight": 0}]}})).unwrap();
/// let path = KeyPath::parse("nest.eggs.0.weight", &Delimiter::default()).unwrap();
///
/// tree.set(&path, json!(42), WritePolicy::CreateMissing).unwrap();
/// assert_eq!(tree.get(&path).unwrap(), &json!(42));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// Build a tree from a root map, lower-casing all keys.
    pub fn new(root: Map<String, Value>) -> Self {
        Self {
            root: lowercase_map(root),
        }
    }

    /// Build a tree from a JSON value whose root must be an object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(root) => Ok(Self::new(root)),
            other => Err(ConfigError::InvalidRoot {
                found: kind_of(&other),
            }),
        }
    }

    /// Build a tree from any serializable value.
    ///
    /// Typed containers such as `Vec<String>` or `HashMap<String, String>`
    /// become generic arrays and maps, so later surgical writes may store a
    /// value of any type in their slots.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ConfigError> {
        let value = serde_json::to_value(value).map_err(ConfigError::JsonError)?;
        Self::from_value(value)
    }

    /// Read the value at `path`.
    ///
    /// Never creates structure. A missing key, a non-numeric or
    /// out-of-bounds index, a scalar in an intermediate position, or a step
    /// from one array into another all yield the corresponding
    /// [`PathError`].
    pub fn get(&self, path: &KeyPath) -> Result<&Value, PathError> {
        let (slot, trace) = path::resolve_ref(&self.root, path.prefix())?;
        path::read_terminal(slot, path.terminal(), trace)
    }

    /// Overwrite the value at `path` in place.
    ///
    /// With [`WritePolicy::CreateMissing`], missing intermediate maps are
    /// created, scalars standing in an intermediate position are replaced by
    /// empty maps, and a missing terminal key is inserted. With
    /// [`WritePolicy::ExistingOnly`], each of those is an error instead.
    /// Arrays are never grown: out-of-bounds indices fail either way.
    pub fn set(&mut self, path: &KeyPath, value: Value, policy: WritePolicy) -> Result<(), PathError> {
        let (slot, trace) = path::resolve_mut(&mut self.root, path.prefix(), policy)?;
        path::write_terminal(slot, path.terminal(), value, policy, trace)
    }

    /// Deep-merge another tree into this one.
    ///
    /// Maps merge key by key; any other value in `other` replaces what is
    /// here, arrays included.
    pub fn merge(&mut self, other: ConfigTree) {
        merge_maps(&mut self.root, other.root);
    }

    /// The root map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Whether the root map has no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Consume the tree, returning the root as a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

impl From<Map<String, Value>> for ConfigTree {
    fn from(root: Map<String, Value>) -> Self {
        Self::new(root)
    }
}

impl TryFrom<toml::Value> for ConfigTree {
    type Error = ConfigError;

    fn try_from(value: toml::Value) -> Result<Self, Self::Error> {
        Self::from_value(toml_to_json(value))
    }
}

/// Convert a TOML value into the JSON representation used by the tree.
///
/// Datetimes become strings; floats that JSON cannot represent become
/// `null`.
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn lowercase_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key.to_lowercase(), lowercase_value(value)))
        .collect()
}

fn lowercase_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(lowercase_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_value).collect()),
        scalar => scalar,
    }
}

fn merge_maps(target: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
