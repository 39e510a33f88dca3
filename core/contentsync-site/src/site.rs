//! In-memory content repository persisted as a JSON snapshot.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use contentsync_model::{AttachmentRecord, ContentItem, FieldGroup, FieldSchema};
use contentsync_types::{ContentId, FileId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{SiteError, SiteResult};
use crate::rules;

/// Everything a site stores. Items and files share one ID sequence, so a
/// bare numeric ID is never ambiguous.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default)]
    pub(crate) last_id: u64,
    #[serde(default)]
    pub(crate) items: Vec<ContentItem>,
    #[serde(default)]
    pub(crate) attachments: Vec<AttachmentRecord>,
    #[serde(default)]
    pub(crate) field_groups: Vec<FieldGroup>,
}

impl Snapshot {
    fn next_id(&mut self) -> u64 {
        let used = self
            .items
            .iter()
            .map(|i| i.id.get())
            .chain(self.attachments.iter().map(|a| a.id.get()))
            .max()
            .unwrap_or(0);
        self.last_id = self.last_id.max(used) + 1;
        self.last_id
    }

    pub(crate) fn item(&self, id: ContentId) -> Option<&ContentItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub(crate) fn item_mut(&mut self, id: ContentId) -> Option<&mut ContentItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub(crate) fn attachment(&self, id: FileId) -> Option<&AttachmentRecord> {
        self.attachments.iter().find(|a| a.id == id)
    }

    /// Groups whose location rules hold for `item`.
    pub(crate) fn groups_for<'s>(
        &'s self,
        item: &'s ContentItem,
    ) -> impl Iterator<Item = &'s FieldGroup> {
        self.field_groups
            .iter()
            .filter(move |g| rules::group_applies(g, item))
    }

    /// Top-level field definitions reachable from groups with one of `keys`.
    pub(crate) fn fields_of_groups(&self, keys: &[String]) -> Vec<FieldSchema> {
        keys.iter()
            .filter_map(|key| self.field_groups.iter().find(|g| &g.key == key))
            .flat_map(|g| g.fields.iter().cloned())
            .collect()
    }
}

/// A content repository held in memory.
///
/// Implements every capability the sync engine consumes, so one type can
/// serve as the source behind the HTTP endpoint and as a pull destination.
pub struct MemorySite {
    state: RwLock<Snapshot>,
    client: Client,
    uploads: Option<Uploads>,
}

/// Where imported files are written and how they are addressed afterwards.
#[derive(Debug, Clone)]
struct Uploads {
    dir: PathBuf,
    public_url: String,
}

impl Default for MemorySite {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::default())
    }
}

impl MemorySite {
    /// Creates an empty site.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            uploads: None,
        }
    }

    /// Loads a site from a JSON snapshot file.
    pub fn load(path: impl AsRef<Path>) -> SiteResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> SiteResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        debug!(
            "Loaded site with {} items, {} files, {} field groups",
            snapshot.items.len(),
            snapshot.attachments.len(),
            snapshot.field_groups.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Writes the current state as a JSON snapshot file.
    pub fn save(&self, path: impl AsRef<Path>) -> SiteResult<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        info!("Saved site to {}", path.as_ref().display());
        Ok(())
    }

    pub fn to_json(&self) -> SiteResult<String> {
        Ok(serde_json::to_string_pretty(&*self.read())?)
    }

    /// Stores imported files under `dir`, addressed as `{public_url}/{name}`.
    /// Without this, imported files keep their source URL.
    #[must_use]
    pub fn with_uploads(mut self, dir: impl Into<PathBuf>, public_url: &str) -> Self {
        self.uploads = Some(Uploads {
            dir: dir.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        });
        self
    }

    // ── Content ──────────────────────────────────────────────────

    /// Creates a new draft item and returns its ID.
    pub fn create_item(&self, content_type: &str, title: &str) -> SiteResult<ContentId> {
        let mut state = self.write();
        let id = ContentId::try_from(state.next_id())?;
        state.items.push(ContentItem::new(id, content_type, title));
        Ok(id)
    }

    /// Inserts or replaces an item, keeping its ID.
    pub fn put_item(&self, item: ContentItem) {
        let mut state = self.write();
        state.last_id = state.last_id.max(item.id.get());
        match state.item_mut(item.id) {
            Some(existing) => *existing = item,
            None => state.items.push(item),
        }
    }

    /// Returns a copy of an item.
    pub fn get_item(&self, id: ContentId) -> Option<ContentItem> {
        self.read().item(id).cloned()
    }

    pub fn items(&self) -> Vec<ContentItem> {
        self.read().items.clone()
    }

    /// Stored value of one custom field.
    pub fn field_value(&self, id: ContentId, name: &str) -> Option<Value> {
        self.read().item(id).and_then(|i| i.fields.get(name).cloned())
    }

    /// Stores a raw custom-field value under its name.
    pub fn set_field_value(&self, id: ContentId, name: &str, value: Value) -> SiteResult<()> {
        let mut state = self.write();
        let item = state
            .item_mut(id)
            .ok_or_else(|| SiteError::NotFound(format!("item {id}")))?;
        item.fields.insert(name.to_string(), value);
        Ok(())
    }

    // ── Files ────────────────────────────────────────────────────

    /// Registers a file that already exists at `url`.
    pub fn add_attachment(&self, url: &str, alt: &str, is_image: bool) -> SiteResult<FileId> {
        let mut state = self.write();
        let id = FileId::try_from(state.next_id())?;
        state.attachments.push(AttachmentRecord {
            id,
            url: url.to_string(),
            alt: alt.to_string(),
            filename: file_name(url),
            is_image,
        });
        Ok(id)
    }

    pub fn get_attachment(&self, id: FileId) -> Option<AttachmentRecord> {
        self.read().attachment(id).cloned()
    }

    pub fn attachments(&self) -> Vec<AttachmentRecord> {
        self.read().attachments.clone()
    }

    /// Downloads `url` and records it as a new file.
    pub(crate) async fn download(&self, url: &str) -> SiteResult<AttachmentRecord> {
        let fail = |message: String| SiteError::Transfer {
            url: url.to_string(),
            message,
        };

        let response = self.client.get(url).send().await.map_err(|e| fail(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fail(format!("HTTP {}", response.status().as_u16())));
        }
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;

        let filename = file_name(url);
        let id = FileId::try_from(self.write().next_id())?;

        let stored_url = match &self.uploads {
            Some(uploads) => {
                let stored_name = format!("{id}-{filename}");
                tokio::fs::create_dir_all(&uploads.dir).await?;
                tokio::fs::write(uploads.dir.join(&stored_name), &bytes).await?;
                format!("{}/{stored_name}", uploads.public_url)
            }
            None => url.to_string(),
        };

        let record = AttachmentRecord {
            id,
            url: stored_url,
            alt: String::new(),
            is_image: is_image_name(&filename),
            filename,
        };
        self.write().attachments.push(record.clone());
        Ok(record)
    }

    // ── Schema ───────────────────────────────────────────────────

    pub fn add_field_group(&self, group: FieldGroup) {
        let mut state = self.write();
        state.field_groups.retain(|g| g.key != group.key);
        state.field_groups.push(group);
    }

    /// Top-level fields currently visible on `item`.
    pub(crate) fn visible_fields(&self, item: ContentId) -> Vec<FieldSchema> {
        let state = self.read();
        let Some(item) = state.item(item) else {
            return Vec::new();
        };
        state
            .groups_for(item)
            .flat_map(|g| g.fields.iter())
            .filter(|f| rules::field_visible(f, item))
            .cloned()
            .collect()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Last path segment of a URL, without query or fragment.
fn file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .find(|s| !s.is_empty() && !s.contains(':'))
        .unwrap_or("download")
        .to_string()
}

fn is_image_name(name: &str) -> bool {
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    matches!(
        ext.as_deref(),
        Some("jpg" | "jpeg" | "png" | "gif" | "webp" | "avif" | "svg" | "bmp" | "ico")
    )
}
