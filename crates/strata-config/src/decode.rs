//! Weakly-typed decoding of a [`ConfigTree`] into typed structures.
//!
//! Overrides sourced from the environment always arrive as strings, and tree
//! keys are always lower-case. The deserializer in this module bridges both
//! gaps so that `nest__eggs__0__weight=42` lands in an `i32` field called
//! `weight`, and the key `somestrings` fills a field called `some_strings`.
//!
//! Coercions applied:
//!
//! | Target           | Accepted input                                         |
//! |------------------|--------------------------------------------------------|
//! | integers         | whole numbers, integral strings, booleans (0/1), `""` or `null` (0) |
//! | floats           | numbers, numeric strings, booleans (0/1), `null` (0)   |
//! | `bool`           | booleans, `1/t/true/yes/y/on`, `0/f/false/no/n/off`, numbers (non-zero) |
//! | `String`         | strings, numbers, booleans, `null` (empty)             |
//! | sequences        | arrays, comma-separated strings, single scalars, `null` |
//! | maps, structs    | maps, `null` or `[]` (empty)                           |
//! | enums            | variant name (case-insensitive) or `{variant: content}` |
//!
//! Struct fields match tree keys exactly first, then ignoring case, `_` and
//! `-`. When several keys land on the same field, an exact match wins over
//! folded ones, and otherwise the first key in the map wins; the rest are
//! dropped.

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess,
    Unexpected, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;
use crate::tree::ConfigTree;

type Error = serde_json::Error;

/// Decode a whole tree into `T`.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use serde_json::json;
/// use strata_config::{decode, ConfigTree};
///
/// #[derive(Deserialize)]
/// struct Egg {
///     weight: i32,
///     some_strings: Vec<String>,
/// }
///
/// let tree = ConfigTree::from_value(json!({"weight": "42", "somestrings": "a,b"})).unwrap();
/// let egg: Egg = decode::from_tree(&tree).unwrap();
/// assert_eq!(egg.weight, 42);
/// assert_eq!(egg.some_strings, ["a", "b"]);
/// ```
pub fn from_tree<T: DeserializeOwned>(tree: &ConfigTree) -> Result<T, ConfigError> {
    from_value(Value::Object(tree.as_map().clone()))
}

/// Decode an arbitrary value into `T` with weak typing.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ConfigError> {
    T::deserialize(WeakDeserializer::new(value)).map_err(ConfigError::Decode)
}

/// Parse a boolean the way configuration sources spell it.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" | "" => Some(false),
        _ => None,
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(Unexpected::Signed)
            .or_else(|| n.as_u64().map(Unexpected::Unsigned))
            .unwrap_or_else(|| Unexpected::Float(n.as_f64().unwrap_or_default())),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn resolve_field(key: String, fields: &'static [&'static str]) -> String {
    if fields.contains(&key.as_str()) {
        return key;
    }
    let folded = fold(&key);
    fields
        .iter()
        .find(|field| fold(field) == folded)
        .map_or(key, |field| (*field).to_string())
}

fn split_list(s: &str) -> Vec<Value> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(|part| Value::String(part.to_string())).collect()
}

// 2^63 and 2^64 are exactly representable; the upper bounds are exclusive.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// Hand a float to an integer visitor only if it is a whole number that
/// fits in 64 bits.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn visit_integral_float<'de, V: Visitor<'de>>(
    f: f64,
    shown: Unexpected<'_>,
    visitor: V,
) -> Result<V::Value, Error> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(de::Error::invalid_value(shown, &visitor));
    }
    if (-I64_BOUND..I64_BOUND).contains(&f) {
        visitor.visit_i64(f as i64)
    } else if (0.0..U64_BOUND).contains(&f) {
        visitor.visit_u64(f as u64)
    } else {
        Err(de::Error::invalid_value(shown, &visitor))
    }
}

/// Deserializer over an owned [`Value`] that coerces scalars leniently.
#[derive(Debug)]
pub struct WeakDeserializer {
    value: Value,
}

impl WeakDeserializer {
    /// Wrap a value.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    fn deserialize_integer<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    visit_integral_float(f, Unexpected::Float(f), visitor)
                }
            }
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    visitor.visit_u64(0)
                } else if let Ok(i) = trimmed.parse::<i64>() {
                    visitor.visit_i64(i)
                } else if let Ok(u) = trimmed.parse::<u64>() {
                    visitor.visit_u64(u)
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    visit_integral_float(f, Unexpected::Str(&s), visitor)
                } else {
                    Err(de::Error::invalid_type(Unexpected::Str(&s), &visitor))
                }
            }
            Value::Bool(b) => visitor.visit_u64(u64::from(b)),
            Value::Null => visitor.visit_u64(0),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_float<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Number(n) => visitor.visit_f64(n.as_f64().unwrap_or_default()),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(f) => visitor.visit_f64(f),
                Err(_) => Err(de::Error::invalid_type(Unexpected::Str(&s), &visitor)),
            },
            Value::Bool(b) => visitor.visit_f64(if b { 1.0 } else { 0.0 }),
            Value::Null => visitor.visit_f64(0.0),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }
}

impl<'de> Deserializer<'de> for WeakDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(WeakSeq::new(items)),
            Value::Object(map) => visitor.visit_map(WeakMap::new(map, None)),
            scalar => scalar.deserialize_any(visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Bool(b) => visitor.visit_bool(b),
            Value::String(s) => match parse_bool(&s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(de::Error::invalid_value(Unexpected::Str(&s), &visitor)),
            },
            Value::Number(n) => visitor.visit_bool(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::Null => visitor.visit_bool(false),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_integer(visitor)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_float(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_float(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Number(n) => visitor.visit_string(n.to_string()),
            Value::Bool(b) => visitor.visit_string(b.to_string()),
            Value::Null => visitor.visit_string(String::new()),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.value.deserialize_bytes(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.value.deserialize_byte_buf(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(WeakDeserializer::new(value)),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.value.deserialize_unit(visitor)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(WeakSeq::new(items)),
            Value::String(s) => visitor.visit_seq(WeakSeq::new(split_list(&s))),
            Value::Null => visitor.visit_seq(WeakSeq::new(Vec::new())),
            Value::Object(_) => Err(de::Error::invalid_type(Unexpected::Map, &visitor)),
            scalar => visitor.visit_seq(WeakSeq::new(vec![scalar])),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Object(map) => visitor.visit_map(WeakMap::new(map, None)),
            Value::Null => visitor.visit_map(WeakMap::new(Map::new(), None)),
            Value::Array(items) if items.is_empty() => {
                visitor.visit_map(WeakMap::new(Map::new(), None))
            }
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Value::Object(map) => visitor.visit_map(WeakMap::new(map, Some(fields))),
            Value::Null => visitor.visit_map(WeakMap::new(Map::new(), Some(fields))),
            Value::Array(items) if items.is_empty() => {
                visitor.visit_map(WeakMap::new(Map::new(), Some(fields)))
            }
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Value::String(s) => visitor.visit_enum(WeakEnum {
                variant: resolve_field(s, variants),
                content: None,
            }),
            Value::Object(map) if map.len() == 1 => {
                let Some((variant, content)) = map.into_iter().next() else {
                    return Err(de::Error::custom("expected a single-key map for enum"));
                };
                visitor.visit_enum(WeakEnum {
                    variant: resolve_field(variant, variants),
                    content: Some(content),
                })
            }
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }
}

struct WeakSeq {
    iter: std::vec::IntoIter<Value>,
}

impl WeakSeq {
    fn new(items: Vec<Value>) -> Self {
        Self {
            iter: items.into_iter(),
        }
    }
}

impl<'de> SeqAccess<'de> for WeakSeq {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Error> {
        self.iter
            .next()
            .map(|value| seed.deserialize(WeakDeserializer::new(value)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct WeakMap {
    iter: std::vec::IntoIter<(String, Value)>,
    pending: Option<Value>,
}

impl WeakMap {
    fn new(map: Map<String, Value>, fields: Option<&'static [&'static str]>) -> Self {
        let entries: Vec<(String, Value)> = match fields {
            Some(fields) => resolve_entries(map, fields),
            None => map.into_iter().collect(),
        };
        Self {
            iter: entries.into_iter(),
            pending: None,
        }
    }
}

/// Rename keys to the struct fields they match, keeping one entry per field.
fn resolve_entries(map: Map<String, Value>, fields: &'static [&'static str]) -> Vec<(String, Value)> {
    let mut entries: Vec<(String, Value, bool)> = Vec::with_capacity(map.len());

    for (key, value) in map {
        let exact = fields.contains(&key.as_str());
        let field = resolve_field(key, fields);
        match entries.iter_mut().find(|(existing, _, _)| *existing == field) {
            Some(entry) if exact && !entry.2 => {
                debug!(field = %field, "exact key replaces a folded duplicate");
                entry.1 = value;
                entry.2 = true;
            }
            Some(_) => debug!(field = %field, "dropping duplicate key for field"),
            None => entries.push((field, value, exact)),
        }
    }

    entries
        .into_iter()
        .map(|(field, value, _)| (field, value))
        .collect()
}

impl<'de> MapAccess<'de> for WeakMap {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        self.pending = Some(value);
        seed.deserialize(WeakDeserializer::new(Value::String(key)))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| <Error as de::Error>::custom("value requested before key"))?;
        seed.deserialize(WeakDeserializer::new(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct WeakEnum {
    variant: String,
    content: Option<Value>,
}

impl<'de> EnumAccess<'de> for WeakEnum {
    type Error = Error;
    type Variant = WeakVariant;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, WeakVariant), Error> {
        let variant = seed.deserialize(KeyDeserializer(self.variant))?;
        Ok((
            variant,
            WeakVariant {
                content: self.content,
            },
        ))
    }
}

struct WeakVariant {
    content: Option<Value>,
}

impl WeakVariant {
    fn content(self) -> WeakDeserializer {
        WeakDeserializer::new(self.content.unwrap_or(Value::Null))
    }
}

impl<'de> VariantAccess<'de> for WeakVariant {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.content {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(de::Error::invalid_type(unexpected(&other), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Error> {
        seed.deserialize(self.content())
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        self.content().deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.content().deserialize_struct("", fields, visitor)
    }
}

/// Variant names handed to enum visitors.
struct KeyDeserializer(String);

impl<'de> Deserializer<'de> for KeyDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(self.0)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct ValueContainer {
        value: Value,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Egg {
        #[serde(default)]
        weight: i32,
        #[serde(default)]
        some_values: Vec<ValueContainer>,
        #[serde(default)]
        some_strings: Vec<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Nest {
        name: String,
        count_int: i64,
        count_int16: i16,
        eggs: Vec<Egg>,
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["true", "True", "TRUE", "1", "t", "yes", "on", " y "] {
            assert_eq!(parse_bool(truthy), Some(true), "{truthy}");
        }
        for falsy in ["false", "FALSE", "0", "f", "no", "off", ""] {
            assert_eq!(parse_bool(falsy), Some(false), "{falsy}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_fold_ignores_case_and_separators() {
        assert_eq!(fold("some_strings"), "somestrings");
        assert_eq!(fold("Slot-Claim_TTL"), "slotclaimttl");
    }

    #[test]
    fn test_fields_match_lowercased_keys() {
        let nest: Nest = from_value(json!({
            "name": "robin",
            "countint": "123",
            "countint16": 7.0,
            "eggs": [{
                "weight": "5555",
                "somevalues": [{"value": "heidi"}, {"value": 3}],
                "somestrings": ["a", "b"]
            }]
        }))
        .unwrap();

        assert_eq!(nest.name, "robin");
        assert_eq!(nest.count_int, 123);
        assert_eq!(nest.count_int16, 7);
        assert_eq!(nest.eggs[0].weight, 5555);
        assert_eq!(nest.eggs[0].some_values[0].value, json!("heidi"));
        assert_eq!(nest.eggs[0].some_values[1].value, json!(3));
        assert_eq!(nest.eggs[0].some_strings, ["a", "b"]);
    }

    #[test]
    fn test_scalar_coercions() {
        #[derive(Debug, Deserialize)]
        struct Scalars {
            flag: bool,
            other_flag: bool,
            ratio: f64,
            label: String,
            numeric_label: String,
            small: u8,
        }

        let scalars: Scalars = from_value(json!({
            "flag": "on",
            "otherflag": 0,
            "ratio": "0.25",
            "label": true,
            "numericlabel": 42,
            "small": "200"
        }))
        .unwrap();

        assert!(scalars.flag);
        assert!(!scalars.other_flag);
        assert!((scalars.ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(scalars.label, "true");
        assert_eq!(scalars.numeric_label, "42");
        assert_eq!(scalars.small, 200);
    }

    #[test]
    fn test_out_of_range_integer_fails() {
        #[derive(Debug, Deserialize)]
        struct Small {
            #[allow(dead_code)]
            small: u8,
        }

        let err = from_value::<Small>(json!({"small": "300"})).unwrap_err();
        assert!(matches!(err, ConfigError::Decode(_)));
    }

    #[test]
    fn test_non_numeric_string_fails() {
        #[derive(Debug, Deserialize)]
        struct Weighted {
            #[allow(dead_code)]
            weight: i32,
        }

        let err = from_value::<Weighted>(json!({"weight": "heavy"})).unwrap_err();
        assert!(err.to_string().contains("heavy"));
    }

    #[test]
    fn test_sequences_from_strings_and_scalars() {
        #[derive(Debug, Deserialize)]
        struct Lists {
            hosts: Vec<String>,
            ports: Vec<u16>,
            single: Vec<i32>,
            empty: Vec<String>,
            none: Vec<String>,
        }

        let lists: Lists = from_value(json!({
            "hosts": "a,b,c",
            "ports": "80,443",
            "single": 9,
            "empty": "",
            "none": null
        }))
        .unwrap();

        assert_eq!(lists.hosts, ["a", "b", "c"]);
        assert_eq!(lists.ports, [80, 443]);
        assert_eq!(lists.single, [9]);
        assert!(lists.empty.is_empty());
        assert!(lists.none.is_empty());
    }

    #[test]
    fn test_options_and_maps() {
        #[derive(Debug, Deserialize)]
        struct Extras {
            endpoint: Option<String>,
            timeout: Option<u64>,
            labels: HashMap<String, String>,
            limits: HashMap<u32, bool>,
        }

        let extras: Extras = from_value(json!({
            "endpoint": null,
            "timeout": "30",
            "labels": {"tier": 1},
            "limits": {"10": "yes"}
        }))
        .unwrap();

        assert_eq!(extras.endpoint, None);
        assert_eq!(extras.timeout, Some(30));
        assert_eq!(extras.labels["tier"], "1");
        assert!(extras.limits[&10]);
    }

    #[test]
    fn test_enums() {
        #[derive(Debug, Deserialize, PartialEq)]
        enum Mode {
            AllowAll,
            Opa { endpoint: String },
            Weighted(u32),
        }

        #[derive(Debug, Deserialize)]
        struct Modes {
            unit: Mode,
            structured: Mode,
            newtype: Mode,
        }

        let modes: Modes = from_value(json!({
            "unit": "allowall",
            "structured": {"opa": {"endpoint": "http://localhost:8181"}},
            "newtype": {"Weighted": "3"}
        }))
        .unwrap();

        assert_eq!(modes.unit, Mode::AllowAll);
        assert_eq!(
            modes.structured,
            Mode::Opa {
                endpoint: "http://localhost:8181".to_string()
            }
        );
        assert_eq!(modes.newtype, Mode::Weighted(3));
    }

    #[test]
    fn test_from_tree() {
        let tree = ConfigTree::from_value(json!({"Name": "bob", "nest": null})).unwrap();

        #[derive(Debug, Deserialize)]
        struct Settings {
            name: String,
            nest: Option<Nest>,
        }

        let settings: Settings = from_tree(&tree).unwrap();
        assert_eq!(settings.name, "bob");
        assert!(settings.nest.is_none());
    }

    #[derive(Debug, Deserialize)]
    struct Counter {
        count: i64,
    }

    #[test]
    fn test_fractional_and_huge_numbers_fail() {
        for input in [json!("7.9"), json!(7.5), json!("1e30"), json!(1e30), json!(-1e30)] {
            let result = from_value::<Counter>(json!({ "count": input.clone() }));
            assert!(matches!(result, Err(ConfigError::Decode(_))), "{input}");
        }
    }

    #[test]
    fn test_integral_floats_are_accepted() {
        let counter: Counter = from_value(json!({"count": "1e3"})).unwrap();
        assert_eq!(counter.count, 1000);

        let counter: Counter = from_value(json!({"count": -4.0})).unwrap();
        assert_eq!(counter.count, -4);
    }

    #[test]
    fn test_empty_string_is_zero() {
        let counter: Counter = from_value(json!({"count": ""})).unwrap();
        assert_eq!(counter.count, 0);

        let counter: Counter = from_value(json!({"count": "   "})).unwrap();
        assert_eq!(counter.count, 0);
    }

    #[test]
    fn test_bools_decode_as_integers() {
        #[derive(Debug, Deserialize)]
        struct Flags {
            on: u8,
            off: i32,
        }

        let flags: Flags = from_value(json!({"on": true, "off": false})).unwrap();
        assert_eq!(flags.on, 1);
        assert_eq!(flags.off, 0);
    }

    #[test]
    fn test_null_decodes_as_empty_map_and_struct() {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        struct Limits {
            #[serde(default)]
            max: u32,
        }

        #[derive(Debug, Deserialize)]
        struct Holder {
            labels: HashMap<String, String>,
            limits: Limits,
        }

        let holder: Holder = from_value(json!({"labels": null, "limits": null})).unwrap();
        assert!(holder.labels.is_empty());
        assert_eq!(holder.limits, Limits::default());
    }

    #[test]
    fn test_exact_key_wins_over_folded_duplicate() {
        #[derive(Debug, Deserialize)]
        struct Egg {
            some_strings: Vec<String>,
        }

        let egg: Egg = from_value(json!({
            "somestrings": {"1": "zz"},
            "some_strings": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(egg.some_strings, ["a", "b"]);

        let egg: Egg = from_value(json!({
            "some_strings": ["a", "b"],
            "somestrings": {"1": "zz"}
        }))
        .unwrap();
        assert_eq!(egg.some_strings, ["a", "b"]);
    }

    #[test]
    fn test_first_folded_duplicate_wins() {
        #[derive(Debug, Deserialize)]
        struct Egg {
            some_strings: String,
        }

        let egg: Egg = from_value(json!({"somestrings": "first", "some-strings": "second"})).unwrap();
        assert_eq!(egg.some_strings, "first");
    }
}
