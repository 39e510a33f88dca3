//! Schema-driven resolution of a custom-field payload.
//!
//! The walker pairs each payload value with the destination's definition
//! for that field and produces a value ready to write: file references
//! become destination file IDs, content references destination item IDs,
//! containers recurse. Shape mismatches degrade to an empty value; nothing
//! in here aborts a pull.

use contentsync_model::{Destination, FieldKind, FieldSchema, LAYOUT_KEY, Layout, payload};
use contentsync_types::{ContentId, FileId};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::mapper::ContentMapper;
use crate::media::MediaImporter;

/// Upper bound on retry passes after the first application pass.
pub const MAX_RETRY_PASSES: usize = 5;

/// Which top-level fields were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    /// Field names written, in the order they succeeded.
    pub updated: Vec<String>,
    /// Field names with no usable definition after all passes.
    pub skipped: Vec<String>,
    /// Application passes run, the first one included.
    pub passes: usize,
}

/// Resolves payload values against the destination schema and writes them.
pub struct FieldWalker<'a> {
    dest: Destination<'a>,
    item: ContentId,
    media: MediaImporter<'a>,
    mapper: ContentMapper<'a>,
    updated: Vec<String>,
    skipped: Vec<String>,
    passes: usize,
}

impl<'a> FieldWalker<'a> {
    /// Creates a walker writing to `item` with a fresh reference cache.
    pub fn new(dest: Destination<'a>, item: ContentId) -> Self {
        Self::with_importer(dest, item, MediaImporter::new(dest.files, item))
    }

    /// Creates a walker that shares an importer (and its cache) with
    /// earlier resolution steps of the same pull.
    pub fn with_importer(dest: Destination<'a>, item: ContentId, media: MediaImporter<'a>) -> Self {
        Self {
            dest,
            item,
            media,
            mapper: ContentMapper::new(dest.lookup),
            updated: Vec::new(),
            skipped: Vec::new(),
            passes: 0,
        }
    }

    /// Produces the destination-ready form of `value` for `schema`.
    pub fn resolve<'s>(&'s mut self, value: &'s Value, schema: &'s FieldSchema) -> BoxFuture<'s, Value> {
        async move {
            match &schema.kind {
                FieldKind::Scalar { .. } => value.clone(),
                FieldKind::File { .. } => json!(self.media.resolve(value).await.map_or(0, FileId::get)),
                FieldKind::ContentRef { .. } => self.resolve_content_ref(value, schema),
                FieldKind::Repeater { sub_fields } => {
                    let Some(rows) = value.as_array() else {
                        return json!([]);
                    };
                    let mut out = Vec::with_capacity(rows.len());
                    for row in rows.iter().filter_map(Value::as_object) {
                        out.push(Value::Object(self.resolve_fields(row, sub_fields).await));
                    }
                    Value::Array(out)
                }
                FieldKind::Flexible { layouts } => {
                    let Some(rows) = value.as_array() else {
                        return json!([]);
                    };
                    let mut out = Vec::with_capacity(rows.len());
                    for row in rows.iter().filter_map(Value::as_object) {
                        if let Some(resolved) = self.resolve_layout_row(row, layouts).await {
                            out.push(Value::Object(resolved));
                        }
                    }
                    Value::Array(out)
                }
                FieldKind::Group { sub_fields } => match value.as_object() {
                    Some(fields) => Value::Object(self.resolve_fields(fields, sub_fields).await),
                    None => json!({}),
                },
                FieldKind::Component { field_groups } => {
                    let sub_fields = self
                        .dest
                        .schema
                        .component_fields(field_groups)
                        .filter(|fields| !fields.is_empty());
                    match (sub_fields, value.as_object()) {
                        (Some(sub_fields), Some(fields)) => {
                            Value::Object(self.resolve_fields(fields, &sub_fields).await)
                        }
                        (Some(_), None) => json!({}),
                        (None, _) => value.clone(),
                    }
                }
                FieldKind::Gallery => {
                    let Some(items) = value.as_array() else {
                        return json!([]);
                    };
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        if let Some(id) = self.media.resolve(item).await {
                            out.push(json!(id.get()));
                        }
                    }
                    Value::Array(out)
                }
            }
        }
        .boxed()
    }

    /// Resolves the keys of `source` that `fields` define, in schema order.
    /// Keys missing from `source` are left out.
    async fn resolve_fields(&mut self, source: &Map<String, Value>, fields: &[FieldSchema]) -> Map<String, Value> {
        let mut out = Map::new();
        for field in fields {
            if let Some(value) = source.get(&field.name) {
                let resolved = self.resolve(value, field).await;
                out.insert(field.name.clone(), resolved);
            }
        }
        out
    }

    /// Resolves one flexible-content row. Rows whose layout is missing or
    /// unknown are dropped.
    async fn resolve_layout_row(&mut self, row: &Map<String, Value>, layouts: &[Layout]) -> Option<Map<String, Value>> {
        let name = payload::layout_of(row)?;
        let Some(layout) = layouts.iter().find(|l| l.name == name) else {
            debug!("Dropping flexible row with unknown layout {:?}", name);
            return None;
        };

        let mut out = Map::new();
        out.insert(LAYOUT_KEY.to_string(), json!(layout.name));
        out.extend(self.resolve_fields(row, &layout.sub_fields).await);
        Some(out)
    }

    fn resolve_content_ref(&self, value: &Value, schema: &FieldSchema) -> Value {
        let target = schema.target_content_type();

        if schema.is_multi_value() {
            if let Value::Array(items) = value {
                let ids: Vec<Value> = items
                    .iter()
                    .filter_map(|item| self.mapper.resolve(item, target))
                    .map(|id| json!(id.get()))
                    .collect();
                return Value::Array(ids);
            }
        }

        // A single value narrows to a single ID, even on multi-value fields.
        json!(self.mapper.resolve(value, target).map_or(0, ContentId::get))
    }

    /// Looks up the definition for a top-level field name.
    ///
    /// Falls back to the active field groups when the primary lookup has
    /// nothing, which is the case for fields hidden by a visibility rule.
    fn lookup_schema(&self, name: &str) -> Option<FieldSchema> {
        self.dest.schema.field_schema(name, self.item).or_else(|| {
            self.dest
                .schema
                .field_groups(self.item)
                .iter()
                .find_map(|group| group.find_field(name).cloned())
        })
    }

    /// Resolves and writes one top-level field. Returns whether it was written.
    ///
    /// A field without a definition, or whose write fails, is recorded as
    /// skipped.
    pub async fn apply(&mut self, name: &str, value: &Value) -> bool {
        let Some(schema) = self.lookup_schema(name) else {
            debug!("No field definition for {:?}", name);
            self.mark_skipped(name);
            return false;
        };

        let resolved = self.resolve(value, &schema).await;
        match self.dest.writer.write_field(schema.selector(), &resolved, self.item) {
            Ok(()) => {
                debug!("Updated field {:?} via {}", name, schema.selector());
                self.mark_updated(name);
                true
            }
            Err(e) => {
                warn!("Failed to write field {:?}: {}", name, e);
                self.mark_skipped(name);
                false
            }
        }
    }

    /// Applies every top-level field, then retries skipped ones.
    ///
    /// A field's definition may only appear once a sibling has been
    /// written, so skipped names that are present in `payload` are retried
    /// for up to [`MAX_RETRY_PASSES`] more passes. A pass that resolves
    /// nothing ends the loop.
    pub async fn apply_all(&mut self, payload: &Map<String, Value>) -> WalkReport {
        for (name, value) in payload {
            self.apply(name, value).await;
        }
        self.passes += 1;

        for _ in 0..MAX_RETRY_PASSES {
            let queue: Vec<String> = self
                .skipped
                .iter()
                .filter(|name| payload.contains_key(name.as_str()))
                .cloned()
                .collect();
            if queue.is_empty() {
                break;
            }

            self.passes += 1;
            let mut resolved = 0;
            for name in &queue {
                if let Some(value) = payload.get(name) {
                    if self.apply(name, value).await {
                        resolved += 1;
                    }
                }
            }
            debug!("Retry pass {} resolved {} of {} fields", self.passes, resolved, queue.len());
            if resolved == 0 {
                break;
            }
        }

        if !self.skipped.is_empty() {
            warn!("Skipped fields with no definition: {}", self.skipped.join(", "));
        }
        self.report()
    }

    pub fn updated(&self) -> &[String] {
        &self.updated
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn report(&self) -> WalkReport {
        WalkReport {
            updated: self.updated.clone(),
            skipped: self.skipped.clone(),
            passes: self.passes,
        }
    }

    /// Consumes the walker, returning its report and importer.
    pub fn finish(self) -> (WalkReport, MediaImporter<'a>) {
        let report = self.report();
        (report, self.media)
    }

    fn mark_updated(&mut self, name: &str) {
        self.skipped.retain(|s| s != name);
        if !self.updated.iter().any(|u| u == name) {
            self.updated.push(name.to_string());
        }
    }

    fn mark_skipped(&mut self, name: &str) {
        if !self.skipped.iter().any(|s| s == name) {
            self.skipped.push(name.to_string());
        }
    }
}
