//! Key path grammar and tree walking.
//!
//! A raw key such as `Nest__Eggs__0__Weight` is lower-cased and split on the
//! configured [`Delimiter`] into a [`KeyPath`]. Resolution walks every
//! segment but the last, left to right:
//!
//! - on a map, the segment is a key; a map value is descended into, an array
//!   value switches the walk into array mode so the *next* segment is read
//!   as an index;
//! - in array mode, the segment must be an in-bounds `usize` and the element
//!   must itself be a map. Arrays of arrays are not addressable.
//!
//! The terminal segment is then applied to whatever container was reached.

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, PathError};

/// Default key delimiter.
pub const DEFAULT_DELIMITER: &str = ".";

/// Shell-safe delimiter for environment variable names.
pub const ENV_DELIMITER: &str = "__";

/// Separator between path segments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter(String);

impl Delimiter {
    /// Create a delimiter, rejecting the empty string.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_config::Delimiter;
    ///
    /// assert!(Delimiter::new("__").is_ok());
    /// assert!(Delimiter::new("").is_err());
    /// ```
    pub fn new(delimiter: impl Into<String>) -> Result<Self, ConfigError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(ConfigError::invalid_delimiter("delimiter must not be empty"));
        }
        Ok(Self(delimiter))
    }

    /// The delimiter text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self(DEFAULT_DELIMITER.to_string())
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized, lower-cased key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a raw key into segments.
    ///
    /// The whole key is lower-cased before splitting, so `Nest.Eggs` and
    /// `nest.eggs` address the same slot. A key whose last segment is empty
    /// (`nest.eggs.`, or the empty key) is rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_config::{Delimiter, KeyPath};
    ///
    /// let delimiter = Delimiter::new("__").unwrap();
    /// let path = KeyPath::parse("Nest__Eggs__0__Weight", &delimiter).unwrap();
    /// assert_eq!(path.segments(), ["nest", "eggs", "0", "weight"]);
    /// assert_eq!(path.terminal(), "weight");
    /// ```
    pub fn parse(raw: &str, delimiter: &Delimiter) -> Result<Self, PathError> {
        let lowered = raw.to_lowercase();
        let separator = delimiter.as_str().to_lowercase();
        let segments: Vec<String> = lowered.split(separator.as_str()).map(str::to_owned).collect();

        if segments.last().map_or(true, String::is_empty) {
            return Err(PathError::EmptyTerminal {
                key: raw.to_string(),
            });
        }

        Ok(Self { segments })
    }

    /// All segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every segment except the terminal one.
    pub fn prefix(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The segment naming the field or index to read or write.
    pub fn terminal(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Dotted record of the segments consumed so far, for diagnostics.
#[derive(Debug, Default)]
pub(crate) struct Trace(String);

impl Trace {
    pub(crate) fn push(&mut self, segment: &str) {
        if !self.0.is_empty() {
            self.0.push('.');
        }
        self.0.push_str(segment);
    }

    pub(crate) fn missing_key(&self) -> PathError {
        PathError::MissingKey {
            path: self.0.clone(),
        }
    }

    pub(crate) fn not_an_index(&self) -> PathError {
        PathError::NotAnIndex {
            path: self.0.clone(),
        }
    }

    pub(crate) fn out_of_bounds(&self, index: usize, len: usize) -> PathError {
        PathError::IndexOutOfBounds {
            path: self.0.clone(),
            index,
            len,
        }
    }

    pub(crate) fn not_a_container(&self) -> PathError {
        PathError::NotAContainer {
            path: self.0.clone(),
        }
    }

    pub(crate) fn nested_array(&self) -> PathError {
        PathError::NestedArray {
            path: self.0.clone(),
        }
    }
}

/// How a write treats structure that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Synthesize missing (or scalar) intermediate maps and insert new
    /// terminal keys.
    #[default]
    CreateMissing,
    /// Only overwrite keys that already exist; never add structure.
    ExistingOnly,
}

/// Container reached by a mutable walk.
pub(crate) enum Slot<'t> {
    Map(&'t mut Map<String, Value>),
    Array(&'t mut Vec<Value>),
}

/// Container reached by a read-only walk.
pub(crate) enum SlotRef<'t> {
    Map(&'t Map<String, Value>),
    Array(&'t [Value]),
}

fn parse_index(segment: &str, trace: &Trace) -> Result<usize, PathError> {
    segment.parse::<usize>().map_err(|_| trace.not_an_index())
}

/// Walk `prefix` from `root` for writing.
pub(crate) fn resolve_mut<'t>(
    root: &'t mut Map<String, Value>,
    prefix: &[String],
    policy: WritePolicy,
) -> Result<(Slot<'t>, Trace), PathError> {
    let mut trace = Trace::default();
    let mut slot = Slot::Map(root);

    for segment in prefix {
        trace.push(segment);
        slot = match slot {
            Slot::Map(map) => step_map_mut(map, segment, policy, &trace)?,
            Slot::Array(items) => step_array_mut(items, segment, &trace)?,
        };
    }

    Ok((slot, trace))
}

fn step_map_mut<'t>(
    map: &'t mut Map<String, Value>,
    segment: &str,
    policy: WritePolicy,
    trace: &Trace,
) -> Result<Slot<'t>, PathError> {
    let value = match policy {
        WritePolicy::CreateMissing => map.entry(segment.to_owned()).or_insert_with(|| {
            debug!(path = %trace.0, "creating missing intermediate map");
            Value::Object(Map::new())
        }),
        WritePolicy::ExistingOnly => map.get_mut(segment).ok_or_else(|| trace.missing_key())?,
    };

    if !(value.is_object() || value.is_array()) {
        if policy == WritePolicy::ExistingOnly {
            return Err(trace.not_a_container());
        }
        debug!(path = %trace.0, "replacing scalar with an empty map");
        *value = Value::Object(Map::new());
    }

    match value {
        Value::Object(inner) => Ok(Slot::Map(inner)),
        Value::Array(items) => Ok(Slot::Array(items)),
        _ => Err(trace.not_a_container()),
    }
}

fn step_array_mut<'t>(
    items: &'t mut [Value],
    segment: &str,
    trace: &Trace,
) -> Result<Slot<'t>, PathError> {
    let index = parse_index(segment, trace)?;
    let len = items.len();
    match items.get_mut(index) {
        None => Err(trace.out_of_bounds(index, len)),
        Some(Value::Object(inner)) => Ok(Slot::Map(inner)),
        Some(Value::Array(_)) => Err(trace.nested_array()),
        Some(_) => Err(trace.not_a_container()),
    }
}

/// Walk `prefix` from `root` without creating anything.
pub(crate) fn resolve_ref<'t>(
    root: &'t Map<String, Value>,
    prefix: &[String],
) -> Result<(SlotRef<'t>, Trace), PathError> {
    let mut trace = Trace::default();
    let mut slot = SlotRef::Map(root);

    for segment in prefix {
        trace.push(segment);
        slot = match slot {
            SlotRef::Map(map) => match map.get(segment.as_str()) {
                None => return Err(trace.missing_key()),
                Some(Value::Object(inner)) => SlotRef::Map(inner),
                Some(Value::Array(items)) => SlotRef::Array(items.as_slice()),
                Some(_) => return Err(trace.not_a_container()),
            },
            SlotRef::Array(items) => {
                let index = parse_index(segment, &trace)?;
                match items.get(index) {
                    None => return Err(trace.out_of_bounds(index, items.len())),
                    Some(Value::Object(inner)) => SlotRef::Map(inner),
                    Some(Value::Array(_)) => return Err(trace.nested_array()),
                    Some(_) => return Err(trace.not_a_container()),
                }
            }
        };
    }

    Ok((slot, trace))
}

/// Overwrite the terminal slot of an already-resolved container.
pub(crate) fn write_terminal(
    slot: Slot<'_>,
    terminal: &str,
    value: Value,
    policy: WritePolicy,
    mut trace: Trace,
) -> Result<(), PathError> {
    trace.push(terminal);
    match slot {
        Slot::Map(map) => match policy {
            WritePolicy::CreateMissing => {
                map.insert(terminal.to_owned(), value);
            }
            WritePolicy::ExistingOnly => {
                let existing = map.get_mut(terminal).ok_or_else(|| trace.missing_key())?;
                *existing = value;
            }
        },
        Slot::Array(items) => {
            let index = parse_index(terminal, &trace)?;
            let len = items.len();
            let existing = items
                .get_mut(index)
                .ok_or_else(|| trace.out_of_bounds(index, len))?;
            *existing = value;
        }
    }
    Ok(())
}

/// Read the terminal slot of an already-resolved container.
pub(crate) fn read_terminal<'t>(
    slot: SlotRef<'t>,
    terminal: &str,
    mut trace: Trace,
) -> Result<&'t Value, PathError> {
    trace.push(terminal);
    match slot {
        SlotRef::Map(map) => map.get(terminal).ok_or_else(|| trace.missing_key()),
        SlotRef::Array(items) => {
            let index = parse_index(terminal, &trace)?;
            items
                .get(index)
                .ok_or_else(|| trace.out_of_bounds(index, items.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot() -> Delimiter {
        Delimiter::default()
    }

    #[test]
    fn test_delimiter_rejects_empty() {
        assert!(matches!(
            Delimiter::new(""),
            Err(ConfigError::InvalidDelimiter { .. })
        ));
        assert_eq!(Delimiter::new("__").unwrap().as_str(), "__");
        assert_eq!(Delimiter::default().as_str(), ".");
    }

    #[test]
    fn test_parse_lowercases_segments() {
        let path = KeyPath::parse("Nest.Eggs.0.Weight", &dot()).unwrap();
        assert_eq!(path.segments(), ["nest", "eggs", "0", "weight"]);
        assert_eq!(path.prefix(), ["nest", "eggs", "0"]);
        assert_eq!(path.terminal(), "weight");
        assert_eq!(path.to_string(), "nest.eggs.0.weight");
    }

    #[test]
    fn test_parse_uppercase_delimiter() {
        let delimiter = Delimiter::new("X").unwrap();
        let path = KeyPath::parse("aXb", &delimiter).unwrap();
        assert_eq!(path.segments(), ["a", "b"]);
    }

    #[test]
    fn test_parse_single_segment() {
        let path = KeyPath::parse("Name", &dot()).unwrap();
        assert!(path.prefix().is_empty());
        assert_eq!(path.terminal(), "name");
    }

    #[test]
    fn test_parse_rejects_trailing_delimiter() {
        let err = KeyPath::parse("nest.eggs.0.", &dot()).unwrap_err();
        assert_eq!(
            err,
            PathError::EmptyTerminal {
                key: "nest.eggs.0.".to_string()
            }
        );
        assert!(KeyPath::parse("", &dot()).is_err());
    }

    #[test]
    fn test_parse_keeps_inner_empty_segments() {
        let path = KeyPath::parse("a..b", &dot()).unwrap();
        assert_eq!(path.segments(), ["a", "", "b"]);
    }

    #[test]
    fn test_trace_is_dotted() {
        let mut trace = Trace::default();
        trace.push("nest");
        trace.push("eggs");
        trace.push("0");
        assert_eq!(
            trace.missing_key(),
            PathError::MissingKey {
                path: "nest.eggs.0".to_string()
            }
        );
    }
}
