//! In-memory content repository for contentsync.
//!
//! [`MemorySite`] keeps content items, files and field groups in memory and
//! persists them as a single JSON snapshot. It implements both sides of a
//! sync:
//!
//! - the destination capabilities ([`FieldSchemaLookup`], [`FieldWriter`],
//!   [`FileStore`], [`ContentLookup`], [`ContentStore`]) a pull writes through
//! - [`SourceRepository`], which the HTTP endpoint encodes documents from
//!
//! Field groups apply to an item when all of their location rules hold, and
//! a field is only visible while its conditions hold against the item's
//! current values.
//!
//! [`FieldSchemaLookup`]: contentsync_model::FieldSchemaLookup
//! [`FieldWriter`]: contentsync_model::FieldWriter
//! [`FileStore`]: contentsync_model::FileStore
//! [`ContentLookup`]: contentsync_model::ContentLookup
//! [`ContentStore`]: contentsync_model::ContentStore
//! [`SourceRepository`]: contentsync_model::SourceRepository

mod capabilities;
mod error;
mod rules;
mod site;

pub use error::{SiteError, SiteResult};
pub use site::MemorySite;
