//! Error types for the sync layer.

use contentsync_model::{CapabilityError, DocumentError};
use contentsync_types::ContentId;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a pull or a source request.
///
/// Per-field resolution problems never surface here; they degrade the
/// field and show up in the pull report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source URL or credentials missing.
    #[error("source not configured: {0}")]
    NotConfigured(String),

    /// Configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Transport failure talking to the source.
    #[error("network error requesting {url}: {message}")]
    Network { url: String, message: String },

    /// Source rejected the credentials (after the query fallback, if enabled).
    #[error("invalid source credentials")]
    Unauthorized,

    /// Source answered 404 for the requested item.
    #[error("source item not found at {url}")]
    NotFound { url: String },

    /// Any other non-2xx answer.
    #[error("source returned error: {status}")]
    Source { status: u16 },

    /// Response body was not a well-formed document.
    #[error("invalid response from source: {0}")]
    InvalidResponse(#[from] DocumentError),

    /// The user-supplied source identifier is empty after normalization.
    #[error("invalid source identifier: {0}")]
    InvalidIdentifier(#[from] contentsync_types::Error),

    /// Destination item does not exist.
    #[error("destination item {0} not found")]
    DestinationNotFound(ContentId),

    /// Requested content type differs from the destination item's.
    #[error("source content type {requested} must match destination type {actual}")]
    ContentTypeMismatch { requested: String, actual: String },

    /// A destination write that the pull cannot continue without failed.
    #[error("destination error: {0}")]
    Destination(#[from] CapabilityError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "not_configured",
            Self::Config(_) => "invalid_config",
            Self::Network { .. } => "network_error",
            Self::Unauthorized => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Source { .. } => "source_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::DestinationNotFound(_) => "destination_not_found",
            Self::ContentTypeMismatch { .. } => "content_type_mismatch",
            Self::Destination(_) => "destination_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// The URL that was attempted, for errors where it helps diagnosis.
    pub fn tried_url(&self) -> Option<&str> {
        match self {
            Self::NotFound { url } | Self::Network { url, .. } => Some(url),
            _ => None,
        }
    }
}
