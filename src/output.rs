//! Decoded provisioning outputs
//!
//! Stack outputs arrive over a dynamically-typed JSON channel while expected
//! fixtures are built from native Rust collections. [`OutputValue`] is the
//! common recursive shape both sides are converted into: every consumer
//! handles exactly three cases, and nesting depth is unbounded.
//!
//! Scalars are always carried as text. Numbers, booleans and null decode to
//! their literal text form and are compared as such; `1.0` and `1` are
//! different texts and never coerced into each other.

use std::collections::{BTreeMap, HashMap};

/// One decoded output value: a scalar, an ordered sequence, or a key-ordered
/// mapping, nested arbitrarily
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputValue {
    Scalar(String),
    Sequence(Vec<OutputValue>),
    Mapping(BTreeMap<String, OutputValue>),
}

impl OutputValue {
    /// Render the deterministic canonical encoding of this value
    ///
    /// Scalars encode as JSON string literals, sequences as `[..]` in element
    /// order, mappings as `{..}` in key-sorted order. Two values are
    /// structurally equal iff their canonical encodings are byte-equal,
    /// regardless of how many representational hops each side passed through.
    pub fn canonical(&self) -> String {
        match self {
            OutputValue::Scalar(text) => quote(text),
            OutputValue::Sequence(items) => {
                let inner: Vec<String> = items.iter().map(OutputValue::canonical).collect();
                format!("[{}]", inner.join(","))
            }
            OutputValue::Mapping(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}:{}", quote(key), value.canonical()))
                    .collect();
                format!("{{{}}}", inner.join(","))
            }
        }
    }

    /// The scalar text, if this value is a scalar
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            OutputValue::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// The elements, if this value is a sequence
    pub fn as_sequence(&self) -> Option<&[OutputValue]> {
        match self {
            OutputValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this value is a mapping
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, OutputValue>> {
        match self {
            OutputValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// The value as display text: scalar text verbatim, composites as their
    /// canonical encoding
    pub fn to_text(&self) -> String {
        match self {
            OutputValue::Scalar(text) => text.clone(),
            other => other.canonical(),
        }
    }
}

/// JSON string literal escaping, shared by scalars and mapping keys
fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

impl From<&serde_json::Value> for OutputValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => OutputValue::Scalar("null".to_string()),
            serde_json::Value::Bool(b) => OutputValue::Scalar(b.to_string()),
            serde_json::Value::Number(n) => OutputValue::Scalar(n.to_string()),
            serde_json::Value::String(s) => OutputValue::Scalar(s.clone()),
            serde_json::Value::Array(items) => {
                OutputValue::Sequence(items.iter().map(OutputValue::from).collect())
            }
            serde_json::Value::Object(entries) => OutputValue::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), OutputValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for OutputValue {
    fn from(value: serde_json::Value) -> Self {
        OutputValue::from(&value)
    }
}

impl From<&serde_yaml::Value> for OutputValue {
    fn from(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => OutputValue::Scalar("null".to_string()),
            serde_yaml::Value::Bool(b) => OutputValue::Scalar(b.to_string()),
            serde_yaml::Value::Number(n) => OutputValue::Scalar(n.to_string()),
            serde_yaml::Value::String(s) => OutputValue::Scalar(s.clone()),
            serde_yaml::Value::Sequence(items) => {
                OutputValue::Sequence(items.iter().map(OutputValue::from).collect())
            }
            serde_yaml::Value::Mapping(entries) => OutputValue::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (yaml_key_text(k), OutputValue::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => OutputValue::from(&tagged.value),
        }
    }
}

/// Mapping keys must be text; non-string YAML keys use their literal form
fn yaml_key_text(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => OutputValue::from(other).to_text(),
    }
}

impl From<&str> for OutputValue {
    fn from(text: &str) -> Self {
        OutputValue::Scalar(text.to_string())
    }
}

impl From<String> for OutputValue {
    fn from(text: String) -> Self {
        OutputValue::Scalar(text)
    }
}

impl From<&String> for OutputValue {
    fn from(text: &String) -> Self {
        OutputValue::Scalar(text.clone())
    }
}

impl<T: Into<OutputValue>> From<Vec<T>> for OutputValue {
    fn from(items: Vec<T>) -> Self {
        OutputValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<OutputValue>> From<BTreeMap<String, T>> for OutputValue {
    fn from(entries: BTreeMap<String, T>) -> Self {
        OutputValue::Mapping(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<OutputValue>> From<HashMap<String, T>> for OutputValue {
    fn from(entries: HashMap<String, T>) -> Self {
        // BTreeMap collection sorts the keys, keeping the encoding deterministic
        OutputValue::Mapping(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}
