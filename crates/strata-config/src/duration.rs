//! Human-readable [`Duration`] fields.
//!
//! Use with `#[serde(with = "strata_config::duration")]`. Strings such as
//! `5s`, `2m30s`, `500ms` or `1h` are parsed with `humantime`; bare integers
//! are taken as nanoseconds. Fractional unit amounts such as `1.5h` or
//! `0.5s` are also accepted. Negative durations are rejected, since
//! [`Duration`] cannot represent them.
//!
//! ```
//! use std::time::Duration;
//!
//! use serde::Deserialize;
//! use serde_json::json;
//! use strata_config::decode;
//!
//! #[derive(Deserialize)]
//! struct Heartbeat {
//!     #[serde(with = "strata_config::duration", default)]
//!     interval: Duration,
//! }
//!
//! let hb: Heartbeat = decode::from_value(json!({"interval": "2m30s"})).unwrap();
//! assert_eq!(hb.interval, Duration::from_secs(150));
//! ```

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

/// Serialize a duration as a human-readable string.
pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

/// Deserialize a duration from a human-readable string or nanoseconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a duration such as \"5s\" or a number of nanoseconds")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        let value = value.trim();
        if let Ok(nanos) = value.parse::<u64>() {
            return Ok(Duration::from_nanos(nanos));
        }
        humantime::parse_duration(value)
            .or_else(|e| parse_fractional(value).ok_or(e))
            .map_err(|e| E::custom(format!("invalid duration {value:?}: {e}")))
    }

    fn visit_u64<E: de::Error>(self, nanos: u64) -> Result<Duration, E> {
        Ok(Duration::from_nanos(nanos))
    }

    fn visit_i64<E: de::Error>(self, nanos: i64) -> Result<Duration, E> {
        u64::try_from(nanos)
            .map(Duration::from_nanos)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(nanos), &self))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn visit_f64<E: de::Error>(self, nanos: f64) -> Result<Duration, E> {
        if nanos.is_sign_negative() || !nanos.is_finite() {
            return Err(E::invalid_value(de::Unexpected::Float(nanos), &self));
        }
        Ok(Duration::from_nanos(nanos as u64))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Duration, E> {
        Ok(Duration::ZERO)
    }
}

/// Parse a sequence of `<decimal><unit>` terms such as `1.5h` or `1.5m30s`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_fractional(value: &str) -> Option<Duration> {
    let mut rest = value;
    let mut total = 0.0_f64;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let amount: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3_600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += amount * nanos_per_unit;
    }

    // Whole nanoseconds below 2^64
    if !total.is_finite() || total >= 18_446_744_073_709_551_616.0 {
        return None;
    }
    Some(Duration::from_nanos(total.round() as u64))
}
