use contentsync_types::{normalize_slug, sanitize_key};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::DocumentError;

/// The document a source returns for one content item.
///
/// Decoding is lenient the way the destination treats untrusted input:
/// scalars of the wrong type become strings, and `featured_media` / `acf`
/// values that are not objects count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub page_template: Option<String>,
    #[serde(default, deserialize_with = "object_or_none")]
    pub featured_media: Option<Value>,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub acf: Map<String, Value>,
}

impl ContentDocument {
    /// Decodes a response body. The body must be a JSON object.
    pub fn parse(body: &[u8]) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        if !value.is_object() {
            return Err(DocumentError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Top-level content written to the destination item in a single update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUpdate {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub status: String,
}

impl ContentUpdate {
    /// Builds the update from a document. Slugs are normalized and the
    /// status key-sanitized, falling back to `draft`.
    pub fn from_document(doc: &ContentDocument) -> Self {
        let status = doc
            .status
            .as_deref()
            .map(sanitize_key)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "draft".to_string());

        Self {
            title: doc.title.trim().to_string(),
            content: doc.content.clone(),
            excerpt: doc.excerpt.clone(),
            slug: normalize_slug(&doc.slug),
            status,
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(crate::payload::positive_int(&Value::deserialize(deserializer)?).unwrap_or(0))
}

fn object_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.is_object().then_some(value))
}

fn object_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}
