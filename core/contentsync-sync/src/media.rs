//! File reference resolution.

use contentsync_model::{AttachmentRef, FileStore};
use contentsync_types::{ContentId, FileId};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::ReferenceCache;

/// Imports referenced files into the destination, at most once per URL.
pub struct MediaImporter<'a> {
    files: &'a dyn FileStore,
    attach_to: ContentId,
    cache: ReferenceCache,
    imported: usize,
}

impl<'a> MediaImporter<'a> {
    /// Creates an importer attaching new files to `attach_to`.
    pub fn new(files: &'a dyn FileStore, attach_to: ContentId) -> Self {
        Self::with_cache(files, attach_to, ReferenceCache::new())
    }

    /// Creates an importer that starts from an existing cache.
    pub fn with_cache(files: &'a dyn FileStore, attach_to: ContentId, cache: ReferenceCache) -> Self {
        Self {
            files,
            attach_to,
            cache,
            imported: 0,
        }
    }

    /// Resolves a payload value. Only well-formed attachment references
    /// resolve; anything else is `None`.
    pub async fn resolve(&mut self, value: &Value) -> Option<FileId> {
        let reference = AttachmentRef::from_payload(value)?;
        self.resolve_attachment(&reference.url, &reference.alt).await
    }

    /// Returns the destination file for `url`, importing it on first sight.
    ///
    /// Import failures are logged and yield `None`; they never abort the pull.
    pub async fn resolve_attachment(&mut self, url: &str, alt: &str) -> Option<FileId> {
        if !is_valid_url(url) {
            debug!("Ignoring malformed file URL {:?}", url);
            return None;
        }
        if let Some(id) = self.cache.get(url) {
            debug!("File {} already imported as {}", url, id);
            return Some(id);
        }

        let id = match self.files.import_file(url, self.attach_to).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to import {}: {}", url, e);
                return None;
            }
        };
        info!("Imported {} as file {}", url, id);
        self.imported += 1;

        if !alt.is_empty() && self.files.is_image(id) {
            if let Err(e) = self.files.set_alt_text(id, alt) {
                warn!("Failed to set alt text on file {}: {}", id, e);
            }
        }

        Some(self.cache.insert(url, id))
    }

    /// Number of files actually imported (cache hits excluded).
    pub fn imported(&self) -> usize {
        self.imported
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    pub fn into_cache(self) -> ReferenceCache {
        self.cache
    }
}

fn is_valid_url(url: &str) -> bool {
    Url::parse(url)
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}
