use contentsync_types::{ContentId, FileId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payload::{AttachmentRef, ContentRef};

/// A content item as held by a repository: top-level content plus the raw
/// custom-field values stored against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub content_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_file: Option<FileId>,
    /// Custom-field values keyed by field name, as stored (file and
    /// content references are local numeric IDs).
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ContentItem {
    pub fn new(id: ContentId, content_type: &str, title: &str) -> Self {
        Self {
            id,
            content_type: content_type.to_string(),
            title: title.to_string(),
            content: String::new(),
            excerpt: String::new(),
            slug: contentsync_types::normalize_slug(title),
            status: default_status(),
            template: None,
            featured_file: None,
            fields: Map::new(),
        }
    }

    /// Summary used when another item references this one.
    pub fn summary(&self) -> ContentSummary {
        ContentSummary {
            id: self.id,
            content_type: self.content_type.clone(),
            slug: self.slug.clone(),
            title: self.title.clone(),
        }
    }
}

fn default_status() -> String {
    "draft".to_string()
}

/// A stored file asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: FileId,
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub is_image: bool,
}

impl From<&AttachmentRecord> for AttachmentRef {
    fn from(record: &AttachmentRecord) -> Self {
        Self {
            id: Some(record.id.get()),
            url: record.url.clone(),
            alt: record.alt.clone(),
            filename: record.filename.clone(),
        }
    }
}

/// The portable identity of a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSummary {
    pub id: ContentId,
    pub content_type: String,
    pub slug: String,
    pub title: String,
}

impl From<&ContentSummary> for ContentRef {
    fn from(summary: &ContentSummary) -> Self {
        Self {
            id: Some(summary.id.get()),
            slug: summary.slug.clone(),
            title: summary.title.clone(),
            bare: None,
        }
    }
}

/// What a bare numeric ID points at in the source repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    Attachment(AttachmentRecord),
    Content(ContentSummary),
}

impl SourceReference {
    /// Encodes the reference in its tagged payload form.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Attachment(record) => AttachmentRef::from(record).to_payload(),
            Self::Content(summary) => ContentRef::from(summary).to_payload(),
        }
    }
}
