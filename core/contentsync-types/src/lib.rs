//! Core type definitions for content sync.
//!
//! This crate defines the small, repository-agnostic types used throughout
//! the sync engine:
//! - Content and file identifiers (positive integers, `0` is "unset")
//! - Source identifiers (numeric ID or slug) as typed by a user
//! - Slug and key normalization shared by both sides of a sync

mod identifier;
mod ids;
mod slug;

pub use identifier::SourceIdentifier;
pub use ids::{ContentId, FileId};
pub use slug::{normalize_slug, sanitize_key};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("identifier must be a positive integer")]
    ZeroId,

    #[error("invalid source identifier: {0:?}")]
    InvalidIdentifier(String),
}
