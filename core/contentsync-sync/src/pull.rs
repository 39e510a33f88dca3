//! One-shot pull of a content item from a source into the destination.

use std::sync::LazyLock;

use contentsync_model::{ContentUpdate, Destination};
use contentsync_types::{ContentId, FileId, SourceIdentifier, sanitize_key};
use regex_lite::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::encoder::DEFAULT_TEMPLATE;
use crate::error::{SyncError, SyncResult};
use crate::media::MediaImporter;
use crate::source::DocumentSource;
use crate::walker::FieldWalker;

/// Templates must be the default or a relative `.php` path.
static TEMPLATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9_./-]+\.php$").expect("template pattern is a valid regex")
});

/// What to pull and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Destination item that gets overwritten.
    pub destination: ContentId,
    /// Source item, by ID or slug.
    pub source: SourceIdentifier,
    /// Content type to request from the source. Defaults to the
    /// destination item's type and must match it.
    pub content_type: Option<String>,
}

impl PullRequest {
    pub fn new(destination: ContentId, source: SourceIdentifier) -> Self {
        Self {
            destination,
            source,
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// Diagnostics of a completed pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub destination: ContentId,
    /// Source-side ID of the pulled item, `0` if the source did not say.
    pub source_id: u64,
    /// Custom fields written.
    pub updated: Vec<String>,
    /// Custom fields left unwritten because no definition was found.
    pub skipped: Vec<String>,
    /// Field application passes run.
    pub passes: usize,
    /// Files downloaded into the destination.
    pub files_imported: usize,
    pub featured_file: Option<FileId>,
    /// Template written, if any.
    pub template: Option<String>,
}

/// Pulls one item: fetches the document, overwrites the destination's
/// top-level content, sets the template and featured file, then resolves
/// and writes the custom fields.
///
/// Only configuration, transport and top-level write failures abort; field
/// problems are reported in the [`PullReport`].
pub async fn pull(
    source: &dyn DocumentSource,
    dest: Destination<'_>,
    request: &PullRequest,
) -> SyncResult<PullReport> {
    let item = request.destination;
    let actual = dest
        .store
        .content_type(item)
        .ok_or(SyncError::DestinationNotFound(item))?;

    let requested = request
        .content_type
        .as_deref()
        .map(sanitize_key)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| actual.clone());
    if requested != actual {
        return Err(SyncError::ContentTypeMismatch { requested, actual });
    }

    info!("Pulling {} {} into item {}", requested, request.source, item);
    let doc = source.fetch_document(&requested, &request.source).await?;

    dest.store.update_content(item, &ContentUpdate::from_document(&doc))?;

    // The template goes first: field groups may be tied to it.
    let mut template = None;
    if let Some(raw) = doc.page_template.as_deref() {
        let candidate = raw.trim();
        if is_allowed_template(candidate) {
            dest.store.set_template(item, candidate)?;
            template = Some(candidate.to_string());
        } else {
            warn!("Ignoring template {:?}: not an allowed template path", raw);
        }
    }

    let mut media = MediaImporter::new(dest.files, item);
    let mut featured_file = None;
    if let Some(featured) = &doc.featured_media {
        if let Some(file) = media.resolve(featured).await {
            match dest.store.set_featured_file(item, file) {
                Ok(()) => featured_file = Some(file),
                Err(e) => warn!("Failed to set featured file {}: {}", file, e),
            }
        }
    }

    let mut walker = FieldWalker::with_importer(dest, item, media);
    if !doc.acf.is_empty() {
        walker.apply_all(&doc.acf).await;
    }
    let (walk, media) = walker.finish();

    info!(
        "Pulled item {}: {} fields updated, {} skipped, {} files imported",
        item,
        walk.updated.len(),
        walk.skipped.len(),
        media.imported()
    );

    Ok(PullReport {
        destination: item,
        source_id: doc.id,
        updated: walk.updated,
        skipped: walk.skipped,
        passes: walk.passes,
        files_imported: media.imported(),
        featured_file,
        template,
    })
}

/// Whether a template value may be written: `default`, or a relative
/// `.php` path made of safe characters.
pub fn is_allowed_template(template: &str) -> bool {
    if template == DEFAULT_TEMPLATE {
        return true;
    }
    !template.contains("..") && TEMPLATE_PATTERN.is_match(template)
}
