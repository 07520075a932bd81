//! Decoding of nested-object and reference-array values
//!
//! Values arrive either as JSON straight from the API or, after a snapshot round
//! trip, as strings holding that JSON. Both forms are accepted; anything else is
//! reported back to the engine as a malformed reference.

use serde_json::Value;
use std::borrow::Cow;

/// A nested-object field value: `{ name, url, ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    /// Display name, flattened to `<field>_name`
    pub name: String,
    /// URL of the referenced entity; empty when the source has none
    pub url: String,
}

/// Decodes a nested-object value
///
/// # Errors
///
/// Returns a reason when the value is not an object (or a string containing one)
/// with a string `name`.
pub fn decode_object_reference(value: &Value) -> Result<ObjectReference, String> {
    let value = unwrap_json_text(value)?;
    let Value::Object(map) = value.as_ref() else {
        return Err(format!("expected an object, got {}", describe(&value)));
    };

    let name = match map.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => return Err(format!("'name' is {}, not a string", describe(other))),
        None => return Err("object has no 'name' key".to_string()),
    };

    let url = match map.get("url") {
        Some(Value::String(url)) => url.clone(),
        _ => String::new(),
    };

    Ok(ObjectReference { name, url })
}

/// Decodes a reference-array value into its URLs
///
/// # Errors
///
/// Returns a reason when the value is not an array (or a string containing one)
/// of strings.
pub fn decode_array_reference(value: &Value) -> Result<Vec<String>, String> {
    let value = unwrap_json_text(value)?;
    let Value::Array(items) = value.as_ref() else {
        return Err(format!("expected a list of URLs, got {}", describe(&value)));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(url) => Ok(url.clone()),
            other => Err(format!("element {i} is {}, not a URL string", describe(other))),
        })
        .collect()
}

/// Renders a scalar cell for the projected table
///
/// Objects and arrays in fields the schema does not declare are kept as JSON text.
pub fn scalar_cell(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

fn unwrap_json_text(value: &Value) -> Result<Cow<'_, Value>, String> {
    match value {
        Value::String(text) => serde_json::from_str(text)
            .map(Cow::Owned)
            .map_err(|e| format!("value is not valid JSON: {e}")),
        other => Ok(Cow::Borrowed(other)),
    }
}

fn describe(value: &Value) -> &'static str {
    crate::domain::entity::json_type(value)
}
