use std::collections::HashMap;

use contentsync_types::FileId;

/// Source URL to destination file ID, for the lifetime of one pull.
///
/// Append-only: the first ID recorded for a URL is kept.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCache {
    files: HashMap<String, FileId>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<FileId> {
        self.files.get(url).copied()
    }

    /// Records an import. Returns the ID now cached for `url`, which is the
    /// earlier one if the URL was already present.
    pub fn insert(&mut self, url: &str, id: FileId) -> FileId {
        *self.files.entry(url.to_string()).or_insert(id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
