//! Attribute conversion functions.
//!
//! Pure functions converting between DynamoDB attribute maps and typed
//! records, routed through `serde_json::Value`. Testable in isolation
//! without store access.

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use larder_core::storage::RepositoryError;

use super::store::Item;

/// Convert one attribute value to its JSON representation.
///
/// Binary values become base64 strings; number sets and string sets become
/// arrays. Number attributes parse as integers first, falling back to
/// floats, since the store keeps arbitrary-precision decimal strings.
pub fn attr_to_json(attr: &AttributeValue) -> Result<Value, RepositoryError> {
    match attr {
        AttributeValue::S(value) => Ok(Value::String(value.clone())),
        AttributeValue::N(value) => parse_number(value),
        AttributeValue::Bool(value) => Ok(Value::Bool(*value)),
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::B(blob) => Ok(Value::String(BASE64.encode(blob.as_ref()))),
        AttributeValue::L(values) => values.iter().map(attr_to_json).collect::<Result<_, _>>().map(Value::Array),
        AttributeValue::M(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (field, value) in map {
                object.insert(field.clone(), attr_to_json(value)?);
            }
            Ok(Value::Object(object))
        }
        AttributeValue::Ss(values) => Ok(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(values) => values
            .iter()
            .map(|value| parse_number(value))
            .collect::<Result<_, _>>()
            .map(Value::Array),
        AttributeValue::Bs(blobs) => Ok(Value::Array(
            blobs
                .iter()
                .map(|blob| Value::String(BASE64.encode(blob.as_ref())))
                .collect(),
        )),
        other => Err(RepositoryError::Serialization(format!(
            "unsupported attribute value: {other:?}"
        ))),
    }
}

fn parse_number(value: &str) -> Result<Value, RepositoryError> {
    if let Ok(int) = value.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| {
            RepositoryError::Serialization(format!("unparseable number attribute: {value}"))
        })
}

/// Convert a JSON value to an attribute value.
pub fn json_to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(flag) => AttributeValue::Bool(*flag),
        Value::Number(number) => AttributeValue::N(number.to_string()),
        Value::String(text) => AttributeValue::S(text.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attr).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(field, value)| (field.clone(), json_to_attr(value)))
                .collect(),
        ),
    }
}

/// Serialize a typed record into a stored item.
pub fn to_item<T: Serialize>(record: &T) -> Result<Item, RepositoryError> {
    let value = serde_json::to_value(record)
        .map_err(|err| RepositoryError::Serialization(err.to_string()))?;
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(field, value)| (field.clone(), json_to_attr(value)))
            .collect()),
        other => Err(RepositoryError::Serialization(format!(
            "record did not serialize to a map: {other:?}"
        ))),
    }
}

/// Deserialize a stored item into a typed record.
pub fn from_item<T: DeserializeOwned>(item: &Item) -> Result<T, RepositoryError> {
    let mut object = serde_json::Map::with_capacity(item.len());
    for (field, value) in item {
        object.insert(field.clone(), attr_to_json(value)?);
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|err| RepositoryError::Serialization(err.to_string()))
}
