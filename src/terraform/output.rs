//! Reading declared stack outputs
//!
//! Outputs come back over `output -json` as one object of
//! `name -> { value, type, sensitive }` entries. Values decode into
//! [`OutputValue`] so nested lists and maps survive the round trip without
//! numeric/string coercion.

use std::collections::BTreeMap;

use crate::common::{Error, Result};
use crate::output::OutputValue;

use super::invoke::run_command;
use super::options::Options;

/// Read one named output
pub async fn read_output(options: &Options, name: &str) -> Result<OutputValue> {
    let mut all = fetch_all(options).await?;
    all.remove(name).ok_or_else(|| Error::OutputNotFound {
        name: name.to_string(),
    })
}

/// Read a set of named outputs in one invocation
pub async fn read_outputs(
    options: &Options,
    names: &[&str],
) -> Result<BTreeMap<String, OutputValue>> {
    let mut all = fetch_all(options).await?;
    let mut selected = BTreeMap::new();
    for name in names {
        let value = all.remove(*name).ok_or_else(|| Error::OutputNotFound {
            name: (*name).to_string(),
        })?;
        selected.insert((*name).to_string(), value);
    }
    Ok(selected)
}

/// Read one output that must be a scalar, as its text
pub async fn output_string(options: &Options, name: &str) -> Result<String> {
    match read_output(options, name).await? {
        OutputValue::Scalar(text) => Ok(text),
        _ => Err(Error::UnexpectedOutputType {
            name: name.to_string(),
            expected: "scalar",
        }),
    }
}

/// Read one output that must be a sequence, as element texts
pub async fn output_list(options: &Options, name: &str) -> Result<Vec<String>> {
    match read_output(options, name).await? {
        OutputValue::Sequence(items) => {
            Ok(items.iter().map(OutputValue::to_text).collect())
        }
        _ => Err(Error::UnexpectedOutputType {
            name: name.to_string(),
            expected: "sequence",
        }),
    }
}

/// Read one output that must be a mapping, as value texts by key
pub async fn output_map(options: &Options, name: &str) -> Result<BTreeMap<String, String>> {
    match read_output(options, name).await? {
        OutputValue::Mapping(entries) => Ok(entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_text()))
            .collect()),
        _ => Err(Error::UnexpectedOutputType {
            name: name.to_string(),
            expected: "mapping",
        }),
    }
}

/// Fetch and decode the full output map
async fn fetch_all(options: &Options) -> Result<BTreeMap<String, OutputValue>> {
    let text = run_command(options, &["output", "-json"]).await?;
    decode_output_json(&text)
}

/// Decode the `output -json` object, unwrapping each entry's `value` field
fn decode_output_json(text: &str) -> Result<BTreeMap<String, OutputValue>> {
    let root: serde_json::Value = serde_json::from_str(text)?;
    let entries = match root {
        serde_json::Value::Object(entries) => entries,
        _ => {
            return Err(Error::Config(format!(
                "Unexpected output JSON shape: {root}"
            )))
        }
    };

    let mut outputs = BTreeMap::new();
    for (name, entry) in entries {
        let value = entry.get("value").unwrap_or(&entry);
        outputs.insert(name, OutputValue::from(value));
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_unwraps_value_entries() {
        let text = r#"{
            "example": {"sensitive": false, "type": "string", "value": "test"},
            "example_list": {"sensitive": false, "type": ["list", "string"], "value": ["test"]}
        }"#;
        let outputs = decode_output_json(text).unwrap();
        assert_eq!(
            outputs.get("example"),
            Some(&OutputValue::Scalar("test".to_string()))
        );
        assert_eq!(
            outputs.get("example_list"),
            Some(&OutputValue::Sequence(vec![OutputValue::Scalar(
                "test".to_string()
            )]))
        );
    }

    #[test]
    fn test_decode_nested_any_value() {
        let text = r#"{
            "example_any": {"value": {"test": {"foo": ["a", "b"]}}}
        }"#;
        let outputs = decode_output_json(text).unwrap();
        let value = outputs.get("example_any").unwrap();
        assert_eq!(value.canonical(), r#"{"test":{"foo":["a","b"]}}"#);
    }

    #[test]
    fn test_decode_rejects_non_object_root() {
        assert!(decode_output_json(r#"["not", "an", "object"]"#).is_err());
    }
}
