//! Typed errors for the content feed library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on the failure class and pick their own retry policy.

use thiserror::Error;

use crate::types::{ContentId, ContentType};

/// Errors that can occur while loading, searching or counting content.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Slug or id does not resolve to an item
    #[error("{content_type} not found: {key}")]
    NotFound {
        content_type: ContentType,
        key: String,
    },

    /// Network or backend failure while fetching
    #[error("fetch failed: {0}")]
    TransientFetch(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response superseded by a newer request. Internal only, never shown.
    #[error("stale result (seq {seq}, latest {latest})")]
    StaleResult { seq: u64, latest: u64 },

    /// Counter increment lost too many races in a row
    #[error("view increment for {owner_id} gave up after {attempts} attempts")]
    ConflictRetryExhausted { owner_id: ContentId, attempts: u32 },

    /// Caller passed arguments outside the accepted range
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl FeedError {
    pub fn not_found(content_type: ContentType, key: impl Into<String>) -> Self {
        FeedError::NotFound {
            content_type,
            key: key.into(),
        }
    }

    /// Wrap any backend error as a transient fetch failure.
    pub fn transient<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FeedError::TransientFetch(error.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FeedError::NotFound { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::TransientFetch(_))
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(error: reqwest::Error) -> Self {
        FeedError::TransientFetch(Box::new(error))
    }
}

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
