//! Capabilities the sync engine consumes from the repositories it talks to.
//!
//! Every lookup or write the engine performs goes through one of these
//! traits, so the walker, importer and mapper can be driven by an in-memory
//! fake in tests and by a real repository in production.

use async_trait::async_trait;
use contentsync_types::{ContentId, FileId};
use serde_json::Value;

use crate::{
    AttachmentRecord, CapabilityError, ContentItem, ContentUpdate, FieldGroup, FieldSchema,
    SourceReference,
};

/// Destination-side field definition lookups.
pub trait FieldSchemaLookup: Send + Sync {
    /// Primary lookup: the field definition currently visible on `item`.
    fn field_schema(&self, name: &str, item: ContentId) -> Option<FieldSchema>;

    /// Active field groups applying to `item`, including fields that are
    /// currently hidden by a visibility condition.
    fn field_groups(&self, item: ContentId) -> Vec<FieldGroup>;

    /// Resolves the sub-schema of a component field from the field groups it
    /// includes. `None` when the repository cannot do this.
    fn component_fields(&self, field_groups: &[String]) -> Option<Vec<FieldSchema>> {
        let _ = field_groups;
        None
    }
}

/// Writes one resolved value under a field selector.
pub trait FieldWriter: Send + Sync {
    fn write_field(&self, selector: &str, value: &Value, item: ContentId)
    -> Result<(), CapabilityError>;
}

/// Destination file storage.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Downloads `url` and stores it as a new file attached to `attach_to`.
    async fn import_file(&self, url: &str, attach_to: ContentId) -> Result<FileId, CapabilityError>;

    fn is_image(&self, file: FileId) -> bool;

    fn set_alt_text(&self, file: FileId, alt: &str) -> Result<(), CapabilityError>;
}

/// Searches destination content items.
pub trait ContentLookup: Send + Sync {
    /// Finds an item of `content_type` whose normalized slug equals `slug`.
    fn find_by_slug(&self, slug: &str, content_type: &str) -> Option<ContentId>;

    /// Finds the most recent item of `content_type` with exactly this title.
    fn find_by_title(&self, title: &str, content_type: &str) -> Option<ContentId>;
}

/// Top-level content of destination items.
pub trait ContentStore: Send + Sync {
    /// Content type of an existing item, `None` if the item does not exist.
    fn content_type(&self, item: ContentId) -> Option<String>;

    fn update_content(&self, item: ContentId, update: &ContentUpdate)
    -> Result<(), CapabilityError>;

    fn set_template(&self, item: ContentId, template: &str) -> Result<(), CapabilityError>;

    fn set_featured_file(&self, item: ContentId, file: FileId) -> Result<(), CapabilityError>;
}

/// Read access to the repository content is encoded from.
pub trait SourceRepository: Send + Sync {
    fn item(&self, id: ContentId) -> Option<ContentItem>;

    fn item_by_slug(&self, slug: &str, content_type: &str) -> Option<ContentItem>;

    /// Field definitions that apply to `item` on the source side.
    fn item_schema(&self, item: &ContentItem) -> Vec<FieldSchema>;

    /// Sub-schema of a component field, `None` when unavailable.
    fn component_schema(&self, field_groups: &[String]) -> Option<Vec<FieldSchema>>;

    fn attachment(&self, id: FileId) -> Option<AttachmentRecord>;

    /// Identifies what a bare numeric ID stored in a field points at.
    fn reference(&self, id: u64) -> Option<SourceReference>;
}

/// The destination-side capabilities one pull needs, borrowed together.
#[derive(Clone, Copy)]
pub struct Destination<'a> {
    pub schema: &'a dyn FieldSchemaLookup,
    pub writer: &'a dyn FieldWriter,
    pub files: &'a dyn FileStore,
    pub lookup: &'a dyn ContentLookup,
    pub store: &'a dyn ContentStore,
}

impl<'a> Destination<'a> {
    /// Borrows every capability from a single repository value.
    pub fn of<S>(site: &'a S) -> Self
    where
        S: FieldSchemaLookup + FieldWriter + FileStore + ContentLookup + ContentStore,
    {
        Self {
            schema: site,
            writer: site,
            files: site,
            lookup: site,
            store: site,
        }
    }
}

impl std::fmt::Debug for Destination<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Destination").finish_non_exhaustive()
    }
}
