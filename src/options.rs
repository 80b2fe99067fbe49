//! Renderer options and their normalization into command-line tokens.
//!
//! Option names are opaque renderer flags. Normalization only fixes the `--` marker and
//! lower-cases the name; values are passed through as text.

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;

/// Value attached to a renderer option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Present with no value.
    Flag,
    /// `true` behaves like `Flag`; `false` drops the option.
    Bool(bool),
    /// Present with one value. An empty string behaves like `Flag`.
    Text(String),
    /// The option repeats once per pair, e.g. several cookies or custom headers.
    Repeated(Vec<(String, String)>),
}

impl From<()> for OptionValue {
    fn from(_: ()) -> Self {
        OptionValue::Flag
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

macro_rules! option_value_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for OptionValue {
            fn from(n: $t) -> Self {
                OptionValue::Text(n.to_string())
            }
        })*
    };
}

option_value_from_number!(i32, i64, u32, u64, usize, f32, f64);

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(OptionValue::Flag)
    }
}

impl<A: Into<String>, B: Into<String>> From<Vec<(A, B)>> for OptionValue {
    fn from(pairs: Vec<(A, B)>) -> Self {
        OptionValue::Repeated(
            pairs
                .into_iter()
                .map(|(a, b)| (a.into(), b.into()))
                .collect(),
        )
    }
}

/// Insertion-ordered option mapping as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: Vec<(String, OptionValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`. An existing identical key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Layer `overrides` on top of `defaults`. Keys are compared after normalization, so
    /// `--Page-Size` overrides `page-size`; the default's position is kept.
    pub fn merge(defaults: &Options, overrides: &Options) -> Options {
        let mut merged = Options::new();
        for (key, value) in defaults.iter().chain(overrides.iter()) {
            let normalized = normalize_key(key);
            match merged
                .entries
                .iter_mut()
                .find(|(k, _)| normalize_key(k) == normalized)
            {
                Some(entry) => entry.1 = value.clone(),
                None => merged.entries.push((key.to_string(), value.clone())),
            }
        }
        merged
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (k, v) in iter {
            options.insert(k, v);
        }
        options
    }
}

/// Prepend `--` unless the key already starts with it, then lower-case the whole key.
pub fn normalize_key(key: &str) -> String {
    if key.starts_with("--") {
        key.to_lowercase()
    } else {
        format!("--{}", key.to_lowercase())
    }
}

/// A normalized option value: what follows the key token on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedValue {
    Flag,
    Value(String),
    Pairs(Vec<(String, String)>),
}

/// Options after normalization, still in caller order. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedOptions {
    entries: Vec<(String, NormalizedValue)>,
}

impl NormalizedOptions {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten to command tokens. Repeated options emit the key before every pair.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for (key, value) in &self.entries {
            match value {
                NormalizedValue::Flag => tokens.push(key.clone()),
                NormalizedValue::Value(v) => {
                    tokens.push(key.clone());
                    tokens.push(v.clone());
                }
                NormalizedValue::Pairs(pairs) => {
                    for (a, b) in pairs {
                        tokens.push(key.clone());
                        tokens.push(a.clone());
                        tokens.push(b.clone());
                    }
                }
            }
        }
        tokens
    }
}

/// Normalize a caller mapping. `Bool(false)` drops the option; `Flag`, `Bool(true)` and empty
/// text keep only the key. Keys colliding after normalization keep the first position and
/// the last value.
pub fn normalize_options(options: &Options) -> NormalizedOptions {
    let mut normalized = NormalizedOptions::default();
    for (key, value) in options.iter() {
        let key = normalize_key(key);
        let value = match value {
            OptionValue::Bool(false) => {
                normalized.entries.retain(|(k, _)| *k != key);
                continue;
            }
            OptionValue::Flag | OptionValue::Bool(true) => NormalizedValue::Flag,
            OptionValue::Text(t) if t.is_empty() => NormalizedValue::Flag,
            OptionValue::Text(t) => NormalizedValue::Value(t.clone()),
            OptionValue::Repeated(pairs) => NormalizedValue::Pairs(pairs.clone()),
        };
        match normalized.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => normalized.entries.push((key, value)),
        }
    }
    normalized
}

impl<'de> Deserialize<'de> for OptionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
            Float(f64),
            Text(String),
            Pairs(Vec<(String, String)>),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => OptionValue::Bool(b),
            Raw::Int(n) => OptionValue::from(n),
            Raw::Float(n) => OptionValue::from(n),
            Raw::Text(s) => OptionValue::Text(s),
            Raw::Pairs(p) => OptionValue::Repeated(p),
        })
    }
}

/// Deserializes from a map, keeping the document order of keys.
impl<'de> Deserialize<'de> for Options {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionsVisitor;

        impl<'de> Visitor<'de> for OptionsVisitor {
            type Value = Options;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of renderer option names to values")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Options, M::Error> {
                let mut options = Options::new();
                while let Some((key, value)) = map.next_entry::<String, OptionValue>()? {
                    if options.get(&key).is_some() {
                        return Err(de::Error::custom(format!("duplicate option '{}'", key)));
                    }
                    options.insert(key, value);
                }
                Ok(options)
            }
        }

        deserializer.deserialize_map(OptionsVisitor)
    }
}
