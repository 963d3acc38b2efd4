//! Environment variable override discovery.
//!
//! Any variable whose name contains the key delimiter is a candidate deep-path
//! override: with the `__` delimiter, `NEST__EGGS__0__WEIGHT=42` addresses
//! `nest.eggs[0].weight`, while `PATH` or `HOME` never qualify. The scanner
//! works on an injected iterator of `(name, value)` pairs so it can be
//! exercised without touching process state; [`process_vars`] supplies the
//! real environment.

use std::collections::BTreeMap;

use crate::path::Delimiter;

/// Filters `(name, value)` pairs down to deep-path override candidates.
///
/// # Example
///
/// ```
/// use strata_config::{Delimiter, EnvScanner};
///
/// let scanner = EnvScanner::new(Delimiter::new("__").unwrap()).with_prefix("APP");
/// let vars = vec![
///     ("APP_nest__eggs__0__weight".to_string(), "42".to_string()),
///     ("PATH".to_string(), "/usr/bin".to_string()),
/// ];
///
/// let candidates = scanner.candidates(vars);
/// assert_eq!(candidates.len(), 1);
/// assert_eq!(candidates["nest__eggs__0__weight"], "42");
/// ```
#[derive(Debug, Clone)]
pub struct EnvScanner {
    delimiter: Delimiter,
    prefix: Option<String>,
}

impl EnvScanner {
    /// Create a scanner matching names that contain `delimiter`.
    pub fn new(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            prefix: None,
        }
    }

    /// Strip `"<prefix>_"` from names that carry it before matching.
    ///
    /// The match is case-sensitive. Names without the prefix are still
    /// considered.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(format!("{prefix}_"));
        self
    }

    /// The prefix as matched, including its trailing underscore.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The delimiter names must contain.
    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// Collect candidate overrides, keyed by the prefix-stripped name.
    ///
    /// The result is ordered by name so overrides apply deterministically.
    /// When two variables strip to the same name, the later one wins.
    pub fn candidates<I>(&self, vars: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(name, value)| {
                let key = self.strip_prefix(&name);
                key.contains(self.delimiter.as_str())
                    .then(|| (key.to_string(), value))
            })
            .collect()
    }

    /// Whether `name` would be treated as an override.
    pub fn is_candidate(&self, name: &str) -> bool {
        self.strip_prefix(name).contains(self.delimiter.as_str())
    }

    fn strip_prefix<'n>(&self, name: &'n str) -> &'n str {
        match &self.prefix {
            Some(prefix) => name.strip_prefix(prefix.as_str()).unwrap_or(name),
            None => name,
        }
    }
}

/// Snapshot the process environment, skipping pairs that are not valid UTF-8.
pub fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn double_underscore() -> EnvScanner {
        EnvScanner::new(Delimiter::new("__").unwrap())
    }

    #[test]
    fn test_names_without_delimiter_are_ignored() {
        let scanner = double_underscore();
        let candidates = scanner.candidates(vars(&[
            ("PATH", "/usr/bin"),
            ("SINGLE_UNDERSCORE", "x"),
            ("nest__eggs__0__weight", "42"),
        ]));

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates["nest__eggs__0__weight"], "42");
        assert!(!scanner.is_candidate("PATH"));
        assert!(scanner.is_candidate("NEST__NAME"));
    }

    #[test]
    fn test_dot_delimiter_never_matches_path() {
        let scanner = EnvScanner::new(Delimiter::default());
        assert!(scanner
            .candidates(vars(&[("PATH", "/usr/bin"), ("HOME", "/root")]))
            .is_empty());
    }

    #[test]
    fn test_prefix_is_stripped() {
        let scanner = double_underscore().with_prefix("APP");
        assert_eq!(scanner.prefix(), Some("APP_"));

        let candidates = scanner.candidates(vars(&[
            ("APP_nest__name", "jay"),
            ("APP_VERSION", "3"),
            ("other__key", "kept"),
        ]));

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates["nest__name"], "jay");
        assert_eq!(candidates["other__key"], "kept");
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let scanner = double_underscore().with_prefix("APP");
        let candidates = scanner.candidates(vars(&[("app_nest__name", "jay")]));
        assert!(candidates.contains_key("app_nest__name"));
    }

    #[test]
    fn test_candidates_are_ordered() {
        let scanner = double_underscore();
        let candidates = scanner.candidates(vars(&[("b__x", "2"), ("a__x", "1"), ("c__x", "3")]));
        let keys: Vec<_> = candidates.keys().cloned().collect();
        assert_eq!(keys, ["a__x", "b__x", "c__x"]);
    }

    #[test]
    fn test_later_duplicate_after_stripping_wins() {
        let scanner = double_underscore().with_prefix("APP");
        let candidates = scanner.candidates(vars(&[("APP_a__b", "1"), ("a__b", "2")]));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates["a__b"], "2");

        let candidates = scanner.candidates(vars(&[("a__b", "2"), ("APP_a__b", "1")]));
        assert_eq!(candidates["a__b"], "1");
    }
}
