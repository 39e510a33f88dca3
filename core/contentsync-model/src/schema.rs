use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Definition of one custom field in a repository's field schema.
///
/// Field definitions arrive as flat records with a `"type"` string and
/// optional `sub_fields` / `layouts`. They are converted into the closed
/// [`FieldKind`] union on load so the walker dispatches on variants, not
/// on type strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawField", into = "RawField")]
pub struct FieldSchema {
    /// Stable selector used for writes (survives renames and hidden states).
    pub key: String,
    /// Field name as it appears in payloads.
    pub name: String,
    pub label: String,
    /// Conditions on sibling values that must hold for the field to be shown.
    pub visible_when: Vec<Condition>,
    pub kind: FieldKind,
}

/// The kind of a field, carrying only the attributes relevant to it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Plain value, passed through unchanged. `type_name` is kept for round-trips.
    Scalar { type_name: String },
    File { media: MediaKind },
    ContentRef {
        target_types: Vec<String>,
        multiple: bool,
        style: RefStyle,
    },
    Repeater { sub_fields: Vec<FieldSchema> },
    Flexible { layouts: Vec<Layout> },
    Group { sub_fields: Vec<FieldSchema> },
    /// Container whose sub-schema lives in other field groups, looked up by key.
    Component { field_groups: Vec<String> },
    Gallery,
}

/// Whether a file field is expected to hold an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    File,
}

/// Content reference flavour. Relationship fields always hold a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefStyle {
    Single,
    Relationship,
}

/// One variant of a flexible-content field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default)]
    pub sub_fields: Vec<FieldSchema>,
}

impl Layout {
    pub fn new(name: &str, sub_fields: Vec<FieldSchema>) -> Self {
        Self {
            key: format!("layout_{name}"),
            name: name.to_string(),
            label: String::new(),
            sub_fields,
        }
    }
}

/// A sibling-value condition: `field` must currently equal `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    #[serde(default)]
    pub equals: Value,
}

const DEFAULT_TARGET_TYPE: &str = "page";

impl FieldSchema {
    /// Creates a field with a derived `field_<name>` key.
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            key: format!("field_{name}"),
            name: name.to_string(),
            label: String::new(),
            visible_when: Vec::new(),
            kind,
        }
    }

    /// Shorthand for a plain value field of the given type.
    pub fn scalar(name: &str, type_name: &str) -> Self {
        Self::new(
            name,
            FieldKind::Scalar {
                type_name: type_name.to_string(),
            },
        )
    }

    /// Shorthand for an image field.
    pub fn image(name: &str) -> Self {
        Self::new(name, FieldKind::File { media: MediaKind::Image })
    }

    /// Shorthand for a generic file field.
    pub fn file(name: &str) -> Self {
        Self::new(name, FieldKind::File { media: MediaKind::File })
    }

    /// Shorthand for a single-or-multi content reference.
    pub fn content_ref(name: &str, target_type: &str, multiple: bool) -> Self {
        Self::new(
            name,
            FieldKind::ContentRef {
                target_types: vec![target_type.to_string()],
                multiple,
                style: RefStyle::Single,
            },
        )
    }

    /// Shorthand for a relationship field (always multi-value).
    pub fn relationship(name: &str, target_type: &str) -> Self {
        Self::new(
            name,
            FieldKind::ContentRef {
                target_types: vec![target_type.to_string()],
                multiple: false,
                style: RefStyle::Relationship,
            },
        )
    }

    pub fn repeater(name: &str, sub_fields: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldKind::Repeater { sub_fields })
    }

    pub fn flexible(name: &str, layouts: Vec<Layout>) -> Self {
        Self::new(name, FieldKind::Flexible { layouts })
    }

    pub fn group(name: &str, sub_fields: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldKind::Group { sub_fields })
    }

    pub fn component(name: &str, field_groups: Vec<String>) -> Self {
        Self::new(name, FieldKind::Component { field_groups })
    }

    pub fn gallery(name: &str) -> Self {
        Self::new(name, FieldKind::Gallery)
    }

    /// Replaces the derived key.
    #[must_use]
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    /// Adds a visibility condition on a sibling field.
    #[must_use]
    pub fn visible_when(mut self, field: &str, equals: Value) -> Self {
        self.visible_when.push(Condition {
            field: field.to_string(),
            equals,
        });
        self
    }

    /// Selector for writes: the stable key, or the name when no key is set.
    pub fn selector(&self) -> &str {
        if self.key.is_empty() { &self.name } else { &self.key }
    }

    /// The type string this field is declared with.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            FieldKind::Scalar { type_name } => type_name,
            FieldKind::File { media: MediaKind::Image } => "image",
            FieldKind::File { media: MediaKind::File } => "file",
            FieldKind::ContentRef { style: RefStyle::Single, .. } => "post_object",
            FieldKind::ContentRef { style: RefStyle::Relationship, .. } => "relationship",
            FieldKind::Repeater { .. } => "repeater",
            FieldKind::Flexible { .. } => "flexible_content",
            FieldKind::Group { .. } => "group",
            FieldKind::Component { .. } => "clone",
            FieldKind::Gallery => "gallery",
        }
    }

    /// Content type that references resolve against. First declared wins,
    /// `page` when none is declared.
    pub fn target_content_type(&self) -> &str {
        match &self.kind {
            FieldKind::ContentRef { target_types, .. } => target_types
                .iter()
                .map(String::as_str)
                .find(|t| !t.is_empty())
                .unwrap_or(DEFAULT_TARGET_TYPE),
            _ => DEFAULT_TARGET_TYPE,
        }
    }

    /// Whether the field stores a list of references.
    pub fn is_multi_value(&self) -> bool {
        matches!(
            &self.kind,
            FieldKind::ContentRef { multiple: true, .. }
                | FieldKind::ContentRef { style: RefStyle::Relationship, .. }
        )
    }

    /// Direct children of a repeater or group.
    pub fn sub_fields(&self) -> &[FieldSchema] {
        match &self.kind {
            FieldKind::Repeater { sub_fields } | FieldKind::Group { sub_fields } => sub_fields,
            _ => &[],
        }
    }

    /// Layouts of a flexible-content field.
    pub fn layouts(&self) -> &[Layout] {
        match &self.kind {
            FieldKind::Flexible { layouts } => layouts,
            _ => &[],
        }
    }

    pub fn sub_field(&self, name: &str) -> Option<&FieldSchema> {
        self.sub_fields().iter().find(|f| f.name == name)
    }

    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts().iter().find(|l| l.name == name)
    }

    /// Depth-first search for a field named `name`: this field, then its
    /// sub-fields, then each layout's sub-fields.
    pub fn find_descendant(&self, name: &str) -> Option<&FieldSchema> {
        self.find_where(&|f| f.name == name)
    }

    fn find_where(&self, matches: &dyn Fn(&FieldSchema) -> bool) -> Option<&FieldSchema> {
        if matches(self) {
            return Some(self);
        }
        self.sub_fields()
            .iter()
            .find_map(|f| f.find_where(matches))
            .or_else(|| {
                self.layouts()
                    .iter()
                    .flat_map(|l| l.sub_fields.iter())
                    .find_map(|f| f.find_where(matches))
            })
    }
}

/// A named collection of field definitions attached to content by location rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// All rules must match for the group to apply. Empty matches everything.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<LocationRule>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl FieldGroup {
    pub fn new(key: &str, fields: Vec<FieldSchema>) -> Self {
        Self {
            key: key.to_string(),
            title: String::new(),
            active: true,
            location: Vec::new(),
            fields,
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: LocationRule) -> Self {
        self.location.push(rule);
        self
    }

    /// Finds a field by name, preferring top-level fields over nested ones.
    pub fn find_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find_map(|f| f.find_descendant(name)))
    }

    /// Finds a field by stable key or name at any depth, preferring
    /// top-level fields. Nested matches come from sub-fields and layouts.
    pub fn find_selector(&self, selector: &str) -> Option<&FieldSchema> {
        let matches = |f: &FieldSchema| f.key == selector || f.name == selector;
        self.fields
            .iter()
            .find(|f| matches(*f))
            .or_else(|| self.fields.iter().find_map(|f| f.find_where(&matches)))
    }
}

/// Where a field group applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "param", rename_all = "snake_case")]
pub enum LocationRule {
    ContentType { value: String },
    Template { value: String },
    /// Group only materializes once another field holds `value`.
    FieldEquals { field: String, value: Value },
}

fn default_true() -> bool {
    true
}

// ── Wire form ────────────────────────────────────────────────────

/// Flat definition record as stored by the destination's field system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawField {
    #[serde(default)]
    key: String,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    label: String,
    #[serde(rename = "type", default)]
    type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sub_fields: Vec<FieldSchema>,
    #[serde(
        default,
        deserialize_with = "list_or_map_values",
        skip_serializing_if = "Vec::is_empty"
    )]
    layouts: Vec<Layout>,
    #[serde(
        default,
        deserialize_with = "string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    post_type: Vec<String>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "is_false")]
    multiple: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    clone: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    visible_when: Vec<Condition>,
}

impl From<RawField> for FieldSchema {
    fn from(raw: RawField) -> Self {
        let kind = match raw.type_name.as_str() {
            "image" => FieldKind::File { media: MediaKind::Image },
            "file" => FieldKind::File { media: MediaKind::File },
            "post_object" => FieldKind::ContentRef {
                target_types: raw.post_type,
                multiple: raw.multiple,
                style: RefStyle::Single,
            },
            "relationship" => FieldKind::ContentRef {
                target_types: raw.post_type,
                multiple: raw.multiple,
                style: RefStyle::Relationship,
            },
            "repeater" => FieldKind::Repeater { sub_fields: raw.sub_fields },
            "flexible_content" => FieldKind::Flexible { layouts: raw.layouts },
            "group" => FieldKind::Group { sub_fields: raw.sub_fields },
            "clone" => FieldKind::Component { field_groups: raw.clone },
            "gallery" => FieldKind::Gallery,
            other => FieldKind::Scalar {
                type_name: other.to_string(),
            },
        };

        Self {
            key: raw.key,
            name: raw.name,
            label: raw.label,
            visible_when: raw.visible_when,
            kind,
        }
    }
}

impl From<FieldSchema> for RawField {
    fn from(field: FieldSchema) -> Self {
        let mut raw = RawField {
            type_name: field.type_name().to_string(),
            key: field.key,
            name: field.name,
            label: field.label,
            visible_when: field.visible_when,
            ..Default::default()
        };
        match field.kind {
            FieldKind::ContentRef { target_types, multiple, .. } => {
                raw.post_type = target_types;
                raw.multiple = multiple;
            }
            FieldKind::Repeater { sub_fields } | FieldKind::Group { sub_fields } => {
                raw.sub_fields = sub_fields;
            }
            FieldKind::Flexible { layouts } => raw.layouts = layouts,
            FieldKind::Component { field_groups } => raw.clone = field_groups,
            FieldKind::Scalar { .. } | FieldKind::File { .. } | FieldKind::Gallery => {}
        }
        raw
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Accepts `true`/`false`, `0`/`1` and `"0"`/`"1"`.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        _ => false,
    })
}

/// Accepts a single string, a list of strings, or anything else as empty.
fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

/// Layouts are stored either as a list or as a map keyed by layout key.
fn list_or_map_values<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Layout>, D::Error> {
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => return Ok(Vec::new()),
    };
    items
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(serde::de::Error::custom))
        .collect()
}
