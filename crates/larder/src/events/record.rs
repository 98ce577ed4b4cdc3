//! Change records delivered from the table's stream.
//!
//! One record per committed row-level mutation, carrying the key attributes
//! and the before/after images in the stream's type-tagged wire form.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use larder_core::resource::PartitionKey;
use larder_core::storage::RepositoryError;

use crate::storage::attrs::attr_to_json;
use crate::storage::store::{ATTR_INDEX, ATTR_PARTITION, ATTR_SORT};

/// Mutation kind of one change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Insert,
    Modify,
    Remove,
}

/// One attribute in a stream image, in the stream's type-tagged form.
///
/// Binary payloads are base64 strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamAttribute {
    S(String),
    N(String),
    B(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    L(Vec<StreamAttribute>),
    M(HashMap<String, StreamAttribute>),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<String>),
}

impl StreamAttribute {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            StreamAttribute::S(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StreamAttribute::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StreamAttribute::Null(_))
    }

    /// Convert to the store's attribute representation.
    pub fn to_attribute_value(&self) -> Result<AttributeValue, RepositoryError> {
        match self {
            StreamAttribute::S(value) => Ok(AttributeValue::S(value.clone())),
            StreamAttribute::N(value) => Ok(AttributeValue::N(value.clone())),
            StreamAttribute::B(value) => Ok(AttributeValue::B(Blob::new(
                BASE64
                    .decode(value)
                    .map_err(|err| RepositoryError::Serialization(err.to_string()))?,
            ))),
            StreamAttribute::Bool(value) => Ok(AttributeValue::Bool(*value)),
            StreamAttribute::Null(value) => Ok(AttributeValue::Null(*value)),
            StreamAttribute::L(values) => Ok(AttributeValue::L(
                values
                    .iter()
                    .map(StreamAttribute::to_attribute_value)
                    .collect::<Result<_, _>>()?,
            )),
            StreamAttribute::M(map) => {
                let mut converted = HashMap::with_capacity(map.len());
                for (field, value) in map {
                    converted.insert(field.clone(), value.to_attribute_value()?);
                }
                Ok(AttributeValue::M(converted))
            }
            StreamAttribute::Ss(values) => Ok(AttributeValue::Ss(values.clone())),
            StreamAttribute::Ns(values) => Ok(AttributeValue::Ns(values.clone())),
            StreamAttribute::Bs(values) => Ok(AttributeValue::Bs(
                values
                    .iter()
                    .map(|value| {
                        BASE64
                            .decode(value)
                            .map(Blob::new)
                            .map_err(|err| RepositoryError::Serialization(err.to_string()))
                    })
                    .collect::<Result<_, _>>()?,
            )),
        }
    }
}

/// One stream image (old or new side of a mutation).
pub type StreamImage = HashMap<String, StreamAttribute>;

/// One row-level mutation notification, consumed once and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub event_kind: EventKind,
    pub keys: StreamImage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<StreamImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<StreamImage>,
}

impl ChangeRecord {
    /// Typed partition of the mutated row, from the always-present keys.
    pub fn partition(&self) -> Option<PartitionKey> {
        self.keys
            .get(ATTR_PARTITION)
            .and_then(StreamAttribute::as_s)
            .and_then(PartitionKey::parse)
    }

    /// Sort key (item id) of the mutated row.
    pub fn sort_key(&self) -> Option<&str> {
        self.keys.get(ATTR_SORT).and_then(StreamAttribute::as_s)
    }

    /// Whichever image is present, preferring the new one.
    pub fn image(&self) -> Option<&StreamImage> {
        self.new_image.as_ref().or(self.old_image.as_ref())
    }

    /// String field from the new image.
    pub fn new_string(&self, field: &str) -> Option<&str> {
        self.new_image
            .as_ref()
            .and_then(|image| image.get(field))
            .and_then(StreamAttribute::as_s)
    }

    /// String field from the old image.
    pub fn old_string(&self, field: &str) -> Option<&str> {
        self.old_image
            .as_ref()
            .and_then(|image| image.get(field))
            .and_then(StreamAttribute::as_s)
    }
}

/// Flatten a stream image into a plain JSON map, excluding the key and
/// index attributes.
pub fn flatten_image(
    image: &StreamImage,
) -> Result<serde_json::Map<String, Value>, RepositoryError> {
    let mut flattened = serde_json::Map::with_capacity(image.len());
    for (field, value) in image {
        if field == ATTR_PARTITION || field == ATTR_SORT || field == ATTR_INDEX {
            continue;
        }
        flattened.insert(field.clone(), attr_to_json(&value.to_attribute_value()?)?);
    }
    Ok(flattened)
}
