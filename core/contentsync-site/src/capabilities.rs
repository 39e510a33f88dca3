//! Sync-engine capabilities implemented over [`MemorySite`].

use async_trait::async_trait;
use contentsync_model::{
    AttachmentRecord, CapabilityError, ContentItem, ContentLookup, ContentStore, ContentUpdate,
    FieldGroup, FieldSchema, FieldSchemaLookup, FieldWriter, FileStore, SourceReference,
    SourceRepository,
};
use contentsync_types::{ContentId, FileId, normalize_slug};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::SiteError;
use crate::site::MemorySite;

impl From<SiteError> for CapabilityError {
    fn from(err: SiteError) -> Self {
        match err {
            SiteError::Transfer { url, message } => CapabilityError::Transfer { url, message },
            other => CapabilityError::Storage(other.to_string()),
        }
    }
}

impl FieldSchemaLookup for MemorySite {
    fn field_schema(&self, name: &str, item: ContentId) -> Option<FieldSchema> {
        self.visible_fields(item).into_iter().find(|f| f.name == name)
    }

    fn field_groups(&self, item: ContentId) -> Vec<FieldGroup> {
        let state = self.read();
        let Some(item) = state.item(item) else {
            return Vec::new();
        };
        state.groups_for(item).cloned().collect()
    }

    fn component_fields(&self, field_groups: &[String]) -> Option<Vec<FieldSchema>> {
        let fields = self.read().fields_of_groups(field_groups);
        (!fields.is_empty()).then_some(fields)
    }
}

impl FieldWriter for MemorySite {
    fn write_field(
        &self,
        selector: &str,
        value: &Value,
        item: ContentId,
    ) -> Result<(), CapabilityError> {
        let mut state = self.write();
        let name = state
            .field_groups
            .iter()
            .find_map(|g| g.find_selector(selector))
            .map(|f| f.name.clone())
            .ok_or_else(|| CapabilityError::Rejected(format!("unknown field {selector}")))?;

        let stored = state
            .item_mut(item)
            .ok_or(CapabilityError::ItemNotFound(item))?;
        stored.fields.insert(name, value.clone());
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemorySite {
    async fn import_file(&self, url: &str, attach_to: ContentId) -> Result<FileId, CapabilityError> {
        let record = self.download(url).await?;
        info!("Imported {} as file {} for item {}", url, record.id, attach_to);
        Ok(record.id)
    }

    fn is_image(&self, file: FileId) -> bool {
        self.read().attachment(file).is_some_and(|a| a.is_image)
    }

    fn set_alt_text(&self, file: FileId, alt: &str) -> Result<(), CapabilityError> {
        let mut state = self.write();
        let record = state
            .attachments
            .iter_mut()
            .find(|a| a.id == file)
            .ok_or(CapabilityError::FileNotFound(file))?;
        record.alt = alt.to_string();
        Ok(())
    }
}

impl ContentLookup for MemorySite {
    fn find_by_slug(&self, slug: &str, content_type: &str) -> Option<ContentId> {
        let wanted = normalize_slug(slug);
        if wanted.is_empty() {
            return None;
        }
        self.read()
            .items
            .iter()
            .find(|i| i.content_type == content_type && normalize_slug(&i.slug) == wanted)
            .map(|i| i.id)
    }

    fn find_by_title(&self, title: &str, content_type: &str) -> Option<ContentId> {
        self.read()
            .items
            .iter()
            .filter(|i| i.content_type == content_type && i.title == title)
            .map(|i| i.id)
            .max()
    }
}

impl ContentStore for MemorySite {
    fn content_type(&self, item: ContentId) -> Option<String> {
        self.read().item(item).map(|i| i.content_type.clone())
    }

    fn update_content(&self, item: ContentId, update: &ContentUpdate) -> Result<(), CapabilityError> {
        let mut state = self.write();
        let stored = state
            .item_mut(item)
            .ok_or(CapabilityError::ItemNotFound(item))?;

        stored.title = update.title.clone();
        stored.content = update.content.clone();
        stored.excerpt = update.excerpt.clone();
        stored.status = update.status.clone();
        stored.slug = if update.slug.is_empty() {
            normalize_slug(&update.title)
        } else {
            update.slug.clone()
        };
        debug!("Updated content of item {}", item);
        Ok(())
    }

    fn set_template(&self, item: ContentId, template: &str) -> Result<(), CapabilityError> {
        let mut state = self.write();
        let stored = state
            .item_mut(item)
            .ok_or(CapabilityError::ItemNotFound(item))?;
        stored.template = Some(template.to_string());
        Ok(())
    }

    fn set_featured_file(&self, item: ContentId, file: FileId) -> Result<(), CapabilityError> {
        let mut state = self.write();
        if state.attachment(file).is_none() {
            return Err(CapabilityError::FileNotFound(file));
        }
        let stored = state
            .item_mut(item)
            .ok_or(CapabilityError::ItemNotFound(item))?;
        stored.featured_file = Some(file);
        Ok(())
    }
}

impl SourceRepository for MemorySite {
    fn item(&self, id: ContentId) -> Option<ContentItem> {
        self.get_item(id)
    }

    fn item_by_slug(&self, slug: &str, content_type: &str) -> Option<ContentItem> {
        let id = self.find_by_slug(slug, content_type)?;
        self.get_item(id)
    }

    fn item_schema(&self, item: &ContentItem) -> Vec<FieldSchema> {
        self.read()
            .groups_for(item)
            .flat_map(|g| g.fields.iter().cloned())
            .collect()
    }

    fn component_schema(&self, field_groups: &[String]) -> Option<Vec<FieldSchema>> {
        self.component_fields(field_groups)
    }

    fn attachment(&self, id: FileId) -> Option<AttachmentRecord> {
        self.get_attachment(id)
    }

    fn reference(&self, id: u64) -> Option<SourceReference> {
        let state = self.read();
        if let Some(file) = FileId::new(id).and_then(|f| state.attachment(f)) {
            return Some(SourceReference::Attachment(file.clone()));
        }
        ContentId::new(id)
            .and_then(|c| state.item(c))
            .map(|item| SourceReference::Content(item.summary()))
    }
}
