//! Source-side payload encoding.
//!
//! Produces exactly the shapes [`FieldWalker`](crate::FieldWalker) consumes:
//! stored file IDs become attachment objects carrying their URL, stored
//! content IDs become post objects carrying slug and title, and containers
//! recurse with the same rules.

use contentsync_model::{
    AttachmentRef, ContentDocument, ContentItem, FieldKind, FieldSchema, LAYOUT_KEY, Layout,
    SourceReference, SourceRepository, payload,
};
use contentsync_types::{ContentId, FileId};
use serde_json::{Map, Value};

/// Template reported for pages that have none set.
pub const DEFAULT_TEMPLATE: &str = "default";

/// Builds wire documents from a source repository.
#[derive(Clone, Copy)]
pub struct PayloadEncoder<'a> {
    source: &'a dyn SourceRepository,
}

impl<'a> PayloadEncoder<'a> {
    pub fn new(source: &'a dyn SourceRepository) -> Self {
        Self { source }
    }

    /// Encodes the complete document for one item.
    pub fn document(&self, item: &ContentItem) -> ContentDocument {
        let page_template = (item.content_type == "page").then(|| {
            item.template
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string())
        });

        ContentDocument {
            id: item.id.get(),
            title: item.title.clone(),
            content: item.content.clone(),
            excerpt: item.excerpt.clone(),
            slug: item.slug.clone(),
            status: Some(item.status.clone()),
            page_template,
            featured_media: item
                .featured_file
                .and_then(|id| self.source.attachment(id))
                .map(|record| AttachmentRef::from(&record).to_payload()),
            acf: self.encode(item),
        }
    }

    /// Encodes the custom-field values of an item, in stored order.
    pub fn encode(&self, item: &ContentItem) -> Map<String, Value> {
        let schema = self.source.item_schema(item);
        item.fields
            .iter()
            .map(|(name, value)| {
                let encoded = match schema.iter().find(|f| &f.name == name) {
                    Some(field) => self.encode_value(value, field),
                    None => self.encode_untyped(value),
                };
                (name.clone(), encoded)
            })
            .collect()
    }

    /// Encodes one stored value according to its field definition.
    pub fn encode_value(&self, value: &Value, schema: &FieldSchema) -> Value {
        match &schema.kind {
            FieldKind::Scalar { .. } => value.clone(),
            FieldKind::File { .. } => self.encode_file(value),
            FieldKind::ContentRef { .. } => match value {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|v| self.encode_content(v)).collect())
                }
                _ => self.encode_content(value),
            },
            FieldKind::Repeater { sub_fields } => match value {
                Value::Array(rows) => Value::Array(
                    rows.iter()
                        .map(|row| match row {
                            Value::Object(fields) => Value::Object(self.encode_fields(fields, sub_fields)),
                            other => other.clone(),
                        })
                        .collect(),
                ),
                _ => value.clone(),
            },
            FieldKind::Flexible { layouts } => match value {
                Value::Array(rows) => Value::Array(
                    rows.iter().map(|row| self.encode_layout_row(row, layouts)).collect(),
                ),
                _ => value.clone(),
            },
            FieldKind::Group { sub_fields } => match value {
                Value::Object(fields) => Value::Object(self.encode_fields(fields, sub_fields)),
                _ => value.clone(),
            },
            FieldKind::Component { field_groups } => {
                match (self.source.component_schema(field_groups), value) {
                    (Some(sub_fields), Value::Object(fields)) => {
                        Value::Object(self.encode_fields(fields, &sub_fields))
                    }
                    _ => self.encode_untyped(value),
                }
            }
            FieldKind::Gallery => match value {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|v| self.encode_file(v)).collect())
                }
                _ => value.clone(),
            },
        }
    }

    /// Encodes every key of a container. Keys without a definition fall
    /// back to untyped encoding so no data is lost.
    fn encode_fields(&self, source: &Map<String, Value>, fields: &[FieldSchema]) -> Map<String, Value> {
        source
            .iter()
            .map(|(name, value)| {
                let encoded = match fields.iter().find(|f| &f.name == name) {
                    Some(field) => self.encode_value(value, field),
                    None => self.encode_untyped(value),
                };
                (name.clone(), encoded)
            })
            .collect()
    }

    fn encode_layout_row(&self, row: &Value, layouts: &[Layout]) -> Value {
        let Value::Object(fields) = row else {
            return row.clone();
        };
        let layout = payload::layout_of(fields).and_then(|name| layouts.iter().find(|l| l.name == name));
        match layout {
            Some(layout) => {
                let mut out = self.encode_fields(fields, &layout.sub_fields);
                out.insert(LAYOUT_KEY.to_string(), Value::String(layout.name.clone()));
                Value::Object(out)
            }
            None => self.encode_untyped(row),
        }
    }

    /// A file field holds a file ID, an expanded file object with `ID`, or
    /// an already-encoded attachment.
    fn encode_file(&self, value: &Value) -> Value {
        if AttachmentRef::from_payload(value).is_some() {
            return value.clone();
        }
        let id = match value {
            Value::Object(obj) => obj.get("ID").and_then(payload::positive_int),
            _ => payload::positive_int(value),
        };
        id.and_then(FileId::new)
            .and_then(|id| self.source.attachment(id))
            .map(|record| AttachmentRef::from(&record).to_payload())
            .or_else(|| value.as_object().and_then(attachment_from_object))
            .unwrap_or_else(|| value.clone())
    }

    /// A content reference holds an item ID or an expanded item object.
    fn encode_content(&self, value: &Value) -> Value {
        let id = match value {
            Value::Object(obj) => obj.get("ID").and_then(payload::positive_int),
            _ => payload::positive_int(value),
        };
        let reference = id
            .and_then(ContentId::new)
            .and_then(|id| self.source.item(id))
            .map(|item| SourceReference::Content(item.summary()));
        match reference {
            Some(reference) => reference.to_payload(),
            None => value.clone(),
        }
    }

    /// Encodes a value with no field definition: expanded file objects
    /// (those with an `ID`) become attachments, bare IDs naming a source
    /// file or item become tagged references, and containers recurse.
    fn encode_untyped(&self, value: &Value) -> Value {
        match value {
            Value::Object(obj) if obj.contains_key("ID") => {
                let record = obj
                    .get("ID")
                    .and_then(payload::positive_int)
                    .and_then(FileId::new)
                    .and_then(|id| self.source.attachment(id));
                match record {
                    Some(record) => AttachmentRef::from(&record).to_payload(),
                    None => attachment_from_object(obj).unwrap_or_else(|| value.clone()),
                }
            }
            Value::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), self.encode_untyped(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.encode_untyped(v)).collect()),
            _ => payload::positive_int(value)
                .and_then(|id| self.source.reference(id))
                .map_or_else(|| value.clone(), |reference| reference.to_payload()),
        }
    }
}

/// Builds an attachment from an expanded file object that carries its own URL.
fn attachment_from_object(obj: &Map<String, Value>) -> Option<Value> {
    let url = obj.get("url").and_then(Value::as_str).filter(|u| !u.is_empty())?;
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(
        AttachmentRef {
            id: obj.get("ID").and_then(payload::positive_int),
            url: url.to_string(),
            alt: text("alt"),
            filename: text("filename"),
        }
        .to_payload(),
    )
}
