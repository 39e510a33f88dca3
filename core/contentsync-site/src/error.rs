//! Error types for the site repository.

use thiserror::Error;

/// Result type for site operations.
pub type SiteResult<T> = Result<T, SiteError>;

/// Errors that can occur loading, saving or querying a site.
#[derive(Debug, Error)]
pub enum SiteError {
    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Item, file or field not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A generated or supplied identifier was out of range.
    #[error(transparent)]
    InvalidId(#[from] contentsync_types::Error),

    /// Downloading a file failed.
    #[error("download of {url} failed: {message}")]
    Transfer { url: String, message: String },

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
