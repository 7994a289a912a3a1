//! Error types for registry operations
//!
//! Every failure the publish engine can produce is a distinct, matchable
//! variant with a stable machine-readable code. Transport layers map
//! [`RegistryError::code`] and [`RegistryError::is_client_error`] onto their
//! own status vocabulary.

use std::time::Duration;
use thiserror::Error;

use crate::repository::StorageError;

/// Result type alias for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Identity or record absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend-level uniqueness violation
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Manifest fails structural checks
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Version string already published for this server
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Server '{name}' has reached the maximum of {max} versions")]
    MaxVersionsReached { name: String, max: usize },

    #[error("Rate limit exceeded: '{subject}' published {count} servers in the last 24 hours (limit {limit})")]
    RateLimitExceeded {
        subject: String,
        count: u64,
        limit: u64,
    },

    #[error("Publishing is disabled")]
    PublishingDisabled,

    /// Validator rejection, message passed through verbatim
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Remote URL '{url}' is already used by server '{owner}'")]
    DuplicateRemoteUrl { url: String, owner: String },

    /// Storage call exceeded its deadline
    #[error("Storage operation timed out after {0:?}")]
    StorageTimeout(Duration),

    /// First write of a two-write commit landed, the second did not
    #[error("Partial commit: {0}")]
    PartialCommit(String),

    /// Opaque backend failure
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),
}

impl RegistryError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidVersion(_) => "invalid_version",
            Self::MaxVersionsReached { .. } => "max_versions_reached",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::PublishingDisabled => "publishing_disabled",
            Self::ValidationFailed(_) => "validation_failed",
            Self::DuplicateRemoteUrl { .. } => "duplicate_remote_url",
            Self::StorageTimeout(_) => "storage_timeout",
            Self::PartialCommit(_) => "partial_commit",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Whether the caller caused the failure (4xx) rather than the registry (5xx)
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::StorageTimeout(_) | Self::PartialCommit(_) | Self::Storage(_)
        )
    }

    /// Whether the error is one of the storage family (`StorageError` in the taxonomy)
    pub fn is_storage_error(&self) -> bool {
        !self.is_client_error()
    }
}

impl From<StorageError> for RegistryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => Self::NotFound(what),
            StorageError::AlreadyExists(what) => Self::AlreadyExists(what),
            StorageError::InvalidCursor(msg) => Self::InvalidInput(format!("invalid cursor: {}", msg)),
            StorageError::Timeout(after) => Self::StorageTimeout(after),
            StorageError::PartialCommit(msg) => Self::PartialCommit(msg),
            other => Self::Storage(other),
        }
    }
}
