//! Shared in-memory destination for sync tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use contentsync_model::{
    CapabilityError, ContentLookup, ContentStore, ContentUpdate, FieldGroup, FieldSchema,
    FieldSchemaLookup, FieldWriter, FileStore,
};
use contentsync_types::{ContentId, FileId, normalize_slug};
use serde_json::Value;

pub fn cid(n: u64) -> ContentId {
    ContentId::new(n).unwrap()
}

pub fn fid(n: u64) -> FileId {
    FileId::new(n).unwrap()
}

struct Item {
    id: u64,
    content_type: String,
    slug: String,
    title: String,
}

/// Destination fake recording every call.
#[derive(Default)]
pub struct FakeSite {
    visible: Vec<FieldSchema>,
    /// Fields that only become visible once the controlling selector is written.
    dependent: Vec<(FieldSchema, String)>,
    groups: Vec<FieldGroup>,
    components: HashMap<String, Vec<FieldSchema>>,
    items: Vec<Item>,
    failing_urls: Vec<String>,
    rejected_selectors: Vec<String>,
    next_file: AtomicU64,
    pub writes: Mutex<Vec<(String, Value)>>,
    pub imports: Mutex<Vec<String>>,
    pub images: Mutex<Vec<FileId>>,
    pub alt_texts: Mutex<Vec<(FileId, String)>>,
    pub updates: Mutex<Vec<ContentUpdate>>,
    pub templates: Mutex<Vec<String>>,
    pub featured: Mutex<Option<FileId>>,
    /// Ordered log of top-level operations.
    pub events: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            next_file: AtomicU64::new(100),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.visible.push(field);
        self
    }

    pub fn with_dependent(mut self, field: FieldSchema, controller: &str) -> Self {
        self.dependent.push((field, controller.to_string()));
        self
    }

    pub fn with_group(mut self, group: FieldGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_component(mut self, key: &str, fields: Vec<FieldSchema>) -> Self {
        self.components.insert(key.to_string(), fields);
        self
    }

    pub fn with_item(mut self, id: u64, content_type: &str, slug: &str, title: &str) -> Self {
        self.items.push(Item {
            id,
            content_type: content_type.to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
        });
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing_urls.push(url.to_string());
        self
    }

    pub fn rejecting(mut self, selector: &str) -> Self {
        self.rejected_selectors.push(selector.to_string());
        self
    }

    /// Last value written under `selector`.
    pub fn written(&self, selector: &str) -> Option<Value> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(s, _)| s == selector)
            .map(|(_, v)| v.clone())
    }

    pub fn import_count(&self) -> usize {
        self.imports.lock().unwrap().len()
    }

    pub fn event_log(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn was_written(&self, selector: &str) -> bool {
        self.writes.lock().unwrap().iter().any(|(s, _)| s == selector)
    }
}

impl FieldSchemaLookup for FakeSite {
    fn field_schema(&self, name: &str, _item: ContentId) -> Option<FieldSchema> {
        self.visible
            .iter()
            .find(|f| f.name == name)
            .or_else(|| {
                self.dependent
                    .iter()
                    .find(|(f, controller)| f.name == name && self.was_written(controller))
                    .map(|(f, _)| f)
            })
            .cloned()
    }

    fn field_groups(&self, _item: ContentId) -> Vec<FieldGroup> {
        self.groups.clone()
    }

    fn component_fields(&self, field_groups: &[String]) -> Option<Vec<FieldSchema>> {
        let fields: Vec<FieldSchema> = field_groups
            .iter()
            .filter_map(|key| self.components.get(key))
            .flatten()
            .cloned()
            .collect();
        (!fields.is_empty()).then_some(fields)
    }
}

impl FieldWriter for FakeSite {
    fn write_field(&self, selector: &str, value: &Value, _item: ContentId) -> Result<(), CapabilityError> {
        if self.rejected_selectors.iter().any(|s| s == selector) {
            return Err(CapabilityError::Rejected(selector.to_string()));
        }
        self.events.lock().unwrap().push(format!("write:{selector}"));
        self.writes.lock().unwrap().push((selector.to_string(), value.clone()));
        Ok(())
    }
}

#[async_trait]
impl FileStore for FakeSite {
    async fn import_file(&self, url: &str, _attach_to: ContentId) -> Result<FileId, CapabilityError> {
        self.events.lock().unwrap().push(format!("import:{url}"));
        if self.failing_urls.iter().any(|u| u == url) {
            return Err(CapabilityError::Transfer {
                url: url.to_string(),
                message: "HTTP 500".to_string(),
            });
        }
        self.imports.lock().unwrap().push(url.to_string());
        let id = fid(self.next_file.fetch_add(1, Ordering::SeqCst));
        if url.ends_with(".png") || url.ends_with(".jpg") {
            self.images.lock().unwrap().push(id);
        }
        Ok(id)
    }

    fn is_image(&self, file: FileId) -> bool {
        self.images.lock().unwrap().contains(&file)
    }

    fn set_alt_text(&self, file: FileId, alt: &str) -> Result<(), CapabilityError> {
        self.alt_texts.lock().unwrap().push((file, alt.to_string()));
        Ok(())
    }
}

impl ContentLookup for FakeSite {
    fn find_by_slug(&self, slug: &str, content_type: &str) -> Option<ContentId> {
        self.items
            .iter()
            .find(|i| i.content_type == content_type && normalize_slug(&i.slug) == slug)
            .map(|i| cid(i.id))
    }

    fn find_by_title(&self, title: &str, content_type: &str) -> Option<ContentId> {
        self.items
            .iter()
            .filter(|i| i.content_type == content_type && i.title == title)
            .max_by_key(|i| i.id)
            .map(|i| cid(i.id))
    }
}

impl ContentStore for FakeSite {
    fn content_type(&self, item: ContentId) -> Option<String> {
        self.items
            .iter()
            .find(|i| i.id == item.get())
            .map(|i| i.content_type.clone())
    }

    fn update_content(&self, _item: ContentId, update: &ContentUpdate) -> Result<(), CapabilityError> {
        self.events.lock().unwrap().push("update".to_string());
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    fn set_template(&self, _item: ContentId, template: &str) -> Result<(), CapabilityError> {
        self.events.lock().unwrap().push(format!("template:{template}"));
        self.templates.lock().unwrap().push(template.to_string());
        Ok(())
    }

    fn set_featured_file(&self, _item: ContentId, file: FileId) -> Result<(), CapabilityError> {
        self.events.lock().unwrap().push(format!("featured:{file}"));
        *self.featured.lock().unwrap() = Some(file);
        Ok(())
    }
}
