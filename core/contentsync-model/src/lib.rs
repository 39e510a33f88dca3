//! Data model shared by every contentsync crate.
//!
//! - [`FieldSchema`] / [`FieldKind`]: the destination's field definitions as a
//!   closed union over field kinds
//! - [`AttachmentRef`] / [`ContentRef`]: the tagged reference shapes inside a payload
//! - [`ContentDocument`]: the wire document a source returns for one item
//! - capability traits ([`FieldSchemaLookup`], [`FileStore`], ...) through
//!   which the engine reaches the repositories on either side

use contentsync_types::{ContentId, FileId};

mod capability;
mod document;
mod item;
pub mod payload;
mod schema;

pub use capability::{
    ContentLookup, ContentStore, Destination, FieldSchemaLookup, FieldWriter, FileStore,
    SourceRepository,
};
pub use document::{ContentDocument, ContentUpdate};
pub use item::{AttachmentRecord, ContentItem, ContentSummary, SourceReference};
pub use payload::{AttachmentRef, ContentRef, LAYOUT_KEY};
pub use schema::{
    Condition, FieldGroup, FieldKind, FieldSchema, Layout, LocationRule, MediaKind, RefStyle,
};

/// Failure reported by a repository capability.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("content item not found: {0}")]
    ItemNotFound(ContentId),

    #[error("file not found: {0}")]
    FileNotFound(FileId),

    #[error("download of {url} failed: {message}")]
    Transfer { url: String, message: String },

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Failure decoding a [`ContentDocument`].
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}
