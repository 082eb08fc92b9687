use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindingsError {
    #[error("failed to read variables file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid variables file")]
    Toml(#[from] toml::de::Error),
    #[error("variable '{name}' is a {kind}; only strings, numbers, booleans and datetimes can be bound")]
    UnsupportedValue { name: String, kind: &'static str },
    #[error("invalid variable assignment '{0}', expected KEY=VALUE")]
    Assignment(String),
    #[error("invalid variable name '{0}': names must be non-empty and contain no braces")]
    InvalidName(String),
}

/// Variable name to literal value.
///
/// A binding set is supplied whole for each render and never mutated by the
/// substitution engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(HashMap<String, String>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct numeric suffixes (`1`, `2`, `12`, ...) that some
    /// key could be split into as `base + suffix` with a non-empty base.
    ///
    /// Row expansion accepts suffixes 1, 2, 3, ... contiguously and each
    /// accepted suffix needs a key ending in it, so this bounds the probe loop.
    pub fn suffix_bound(&self) -> usize {
        let mut suffixes = HashSet::new();
        for key in self.0.keys() {
            let base_len = key.trim_end_matches(|c: char| c.is_ascii_digit()).len();
            for start in base_len.max(1)..key.len() {
                let suffix = &key[start..];
                if !suffix.starts_with('0') {
                    suffixes.insert(suffix);
                }
            }
        }
        suffixes.len()
    }

    /// Parse a TOML table of scalar values.
    ///
    /// Numbers, booleans and datetimes are bound as their TOML spelling.
    pub fn from_toml_str(content: &str) -> Result<Self, BindingsError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut bindings = Self::new();
        for (name, value) in table {
            validate_name(&name)?;
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                other => {
                    return Err(BindingsError::UnsupportedValue {
                        name,
                        kind: other.type_str(),
                    });
                }
            };
            bindings.insert(name, value);
        }
        Ok(bindings)
    }

    pub fn load(path: &Path) -> Result<Self, BindingsError> {
        let content = fs::read_to_string(path).map_err(|source| BindingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Bind a `KEY=VALUE` assignment, replacing any earlier value.
    pub fn assign(&mut self, assignment: &str) -> Result<(), BindingsError> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| BindingsError::Assignment(assignment.to_string()))?;
        validate_name(name)?;
        self.insert(name, value);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), BindingsError> {
    if name.is_empty() || name.contains(['{', '}']) {
        return Err(BindingsError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Bindings {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl From<HashMap<String, String>> for Bindings {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_bound_counts_distinct_suffixes() {
        let bindings = Bindings::from_iter([
            ("state1", "TN"),
            ("city1", "Knoxville"),
            ("state2", "TN"),
            ("title", "Cities"),
        ]);
        assert_eq!(bindings.suffix_bound(), 2);
    }

    #[test]
    fn suffix_bound_splits_multi_digit_suffixes() {
        // "x12" can be "x" + "12" or "x1" + "2"
        let bindings = Bindings::from_iter([("x12", "a")]);
        assert_eq!(bindings.suffix_bound(), 2);
    }

    #[test]
    fn suffix_bound_skips_leading_zero_and_bare_numbers() {
        let bindings = Bindings::from_iter([("x01", "a"), ("7", "b")]);
        assert_eq!(bindings.suffix_bound(), 1);
    }

    #[test]
    fn toml_scalars_become_strings() {
        let bindings = Bindings::from_toml_str(
            r#"
            title = "Cities"
            count = 3
            ratio = 0.5
            draft = false
            "#,
        )
        .unwrap();
        assert_eq!(bindings.get("title"), Some("Cities"));
        assert_eq!(bindings.get("count"), Some("3"));
        assert_eq!(bindings.get("ratio"), Some("0.5"));
        assert_eq!(bindings.get("draft"), Some("false"));
    }

    #[test]
    fn toml_rejects_nested_values() {
        let err = Bindings::from_toml_str("cities = [\"a\", \"b\"]").unwrap_err();
        assert!(matches!(
            err,
            BindingsError::UnsupportedValue { ref name, kind: "array" } if name == "cities"
        ));
    }

    #[test]
    fn toml_rejects_braced_names() {
        let err = Bindings::from_toml_str("\"{x}\" = \"v\"").unwrap_err();
        assert!(matches!(err, BindingsError::InvalidName(_)));
    }

    #[test]
    fn assignment_overrides() {
        let mut bindings = Bindings::from_iter([("city", "Memphis")]);
        bindings.assign("city=Knoxville").unwrap();
        bindings.assign("empty=").unwrap();
        assert_eq!(bindings.get("city"), Some("Knoxville"));
        assert_eq!(bindings.get("empty"), Some(""));
        assert!(matches!(
            bindings.assign("nonsense"),
            Err(BindingsError::Assignment(_))
        ));
    }
}
