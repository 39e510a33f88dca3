//! Tagged reference shapes carried inside a payload.
//!
//! A payload is a schema-less JSON tree. Two object shapes in it are
//! references that need resolving on the destination:
//! - `{"type": "attachment", "id", "url", "alt", "filename"}` for files
//! - `{"type": "post", "id", "slug", "title"}` for other content items
//!
//! Flexible-content rows carry their layout name under [`LAYOUT_KEY`].

use serde_json::{Map, Value, json};

/// Discriminator key on tagged reference objects.
pub const TYPE_KEY: &str = "type";
/// Tag value for file references.
pub const ATTACHMENT_TAG: &str = "attachment";
/// Tag value for content-item references.
pub const POST_TAG: &str = "post";
/// Key holding the layout name on flexible-content rows.
pub const LAYOUT_KEY: &str = "acf_fc_layout";

/// A reference to a file asset, portable by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Source-side ID, informational only.
    pub id: Option<u64>,
    pub url: String,
    pub alt: String,
    pub filename: String,
}

impl AttachmentRef {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_alt(mut self, alt: &str) -> Self {
        self.alt = alt.to_string();
        self
    }

    /// Reads a well-formed attachment reference: an object tagged
    /// `attachment` with a non-empty string `url`.
    pub fn from_payload(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if tag_of(obj) != Some(ATTACHMENT_TAG) {
            return None;
        }
        let url = obj.get("url").and_then(Value::as_str).filter(|u| !u.is_empty())?;

        Some(Self {
            id: obj.get("id").and_then(positive_int),
            url: url.to_string(),
            alt: string_at(obj, "alt"),
            filename: string_at(obj, "filename"),
        })
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "type": ATTACHMENT_TAG,
            "id": self.id.unwrap_or(0),
            "url": self.url,
            "alt": self.alt,
            "filename": self.filename,
        })
    }
}

/// A reference to another content item, portable by slug and title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRef {
    /// Source-side ID. Never used for destination lookups.
    pub id: Option<u64>,
    pub slug: String,
    pub title: String,
    /// Set when the raw payload value was a bare string.
    pub bare: Option<String>,
}

impl ContentRef {
    /// Normalizes any payload value into `(id, slug, title)`.
    ///
    /// Positive numbers (or numeric strings) become `id`; objects contribute
    /// their `id`, `slug` and `title` keys; a non-empty string is also kept
    /// as `bare` so it can be tried as a slug.
    pub fn from_payload(value: &Value) -> Self {
        match value {
            Value::Number(_) => Self {
                id: positive_int(value),
                ..Default::default()
            },
            Value::String(s) if !s.is_empty() => Self {
                id: positive_int(value),
                bare: Some(s.clone()),
                ..Default::default()
            },
            Value::Object(obj) => Self {
                id: obj.get("id").and_then(positive_int),
                slug: string_at(obj, "slug"),
                title: string_at(obj, "title"),
                bare: None,
            },
            _ => Self::default(),
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "type": POST_TAG,
            "id": self.id.unwrap_or(0),
            "slug": self.slug,
            "title": self.title,
        })
    }

    /// True when nothing usable for a lookup was found.
    pub fn is_empty(&self) -> bool {
        self.slug.is_empty() && self.title.is_empty() && self.bare.is_none()
    }
}

/// Returns the `type` tag of a payload object, if any.
pub fn tag_of(obj: &Map<String, Value>) -> Option<&str> {
    obj.get(TYPE_KEY).and_then(Value::as_str)
}

/// Returns the layout name of a flexible-content row. Empty names count as missing.
pub fn layout_of(row: &Map<String, Value>) -> Option<&str> {
    row.get(LAYOUT_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// Reads a strictly positive integer from a number or a numeric string.
pub fn positive_int(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 1.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .filter(|n| *n > 0)
}

fn string_at(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
