//! Content reference resolution.

use contentsync_model::{ContentLookup, ContentRef};
use contentsync_types::{ContentId, normalize_slug};
use serde_json::Value;
use tracing::debug;

/// Maps content references from the source onto destination items.
///
/// The source ID carried by a reference is never used: the two ID spaces
/// are unrelated. Lookups go by slug, then the raw string as a slug, then
/// exact title.
#[derive(Clone, Copy)]
pub struct ContentMapper<'a> {
    lookup: &'a dyn ContentLookup,
}

impl<'a> ContentMapper<'a> {
    pub fn new(lookup: &'a dyn ContentLookup) -> Self {
        Self { lookup }
    }

    /// Resolves a payload value against items of `content_type`.
    pub fn resolve(&self, value: &Value, content_type: &str) -> Option<ContentId> {
        self.resolve_ref(&ContentRef::from_payload(value), content_type)
    }

    pub fn resolve_ref(&self, reference: &ContentRef, content_type: &str) -> Option<ContentId> {
        let by_slug = |raw: &str| {
            let slug = normalize_slug(raw);
            if slug.is_empty() {
                None
            } else {
                self.lookup.find_by_slug(&slug, content_type)
            }
        };

        let found = by_slug(&reference.slug)
            .or_else(|| reference.bare.as_deref().and_then(by_slug))
            .or_else(|| {
                let title = reference.title.trim();
                if title.is_empty() {
                    None
                } else {
                    self.lookup.find_by_title(title, content_type)
                }
            });

        if found.is_none() && !reference.is_empty() {
            debug!(
                "No {} matches slug {:?} or title {:?}",
                content_type, reference.slug, reference.title
            );
        }
        found
    }
}
