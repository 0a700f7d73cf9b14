//! Conversion between plain JSON fields and Firestore's typed values.
//!
//! Firestore wraps each value in a single-key object naming its type:
//! `{"stringValue": "hi"}`, `{"integerValue": "42"}`, and so on.

use notekeeper_core::error::{NotekeeperError, Result, StoreFailure};
use notekeeper_core::note::DocumentFields;
use serde_json::{Map, Value, json};

/// Encodes a field map as a Firestore `fields` object.
pub fn to_firestore_fields(fields: &DocumentFields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), to_firestore_value(value)))
        .collect();
    Value::Object(encoded)
}

fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            json!({ "integerValue": n.to_string() })
        }
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({ "mapValue": { "fields": to_firestore_fields(fields) } }),
    }
}

/// Decodes a Firestore `fields` object into plain JSON.
///
/// A missing `fields` object (an empty document) decodes to an empty map.
pub fn from_firestore_fields(fields: Option<&Value>) -> Result<DocumentFields> {
    let Some(fields) = fields else {
        return Ok(DocumentFields::new());
    };
    let object = fields
        .as_object()
        .ok_or_else(|| malformed("document fields are not an object"))?;

    object
        .iter()
        .map(|(name, value)| Ok((name.clone(), from_firestore_value(value)?)))
        .collect()
}

fn from_firestore_value(value: &Value) -> Result<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| malformed("typed value is not an object"))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| malformed("typed value is empty"))?;

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue"
        | "referenceValue" | "bytesValue" => inner.clone(),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| malformed(format!("bad integerValue: {inner}")))?
        }
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(from_firestore_value)
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Value::Array(values)
        }
        "mapValue" => Value::Object(from_firestore_fields(inner.get("fields"))?),
        other => return Err(malformed(format!("unsupported value type '{other}'"))),
    };
    Ok(decoded)
}

fn malformed(message: impl Into<String>) -> NotekeeperError {
    NotekeeperError::store(StoreFailure::MalformedDocument, message)
}
