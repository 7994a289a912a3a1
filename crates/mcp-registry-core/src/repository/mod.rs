//! Repository traits for data access
//!
//! [`ServerRepository`] is the storage port of the registry. It defines what
//! the publish engine needs from a backend without specifying the
//! implementation (SQLite JSON documents, in-memory, etc.)

mod deadline;

pub use deadline::DeadlineRepository;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{ServerFilter, ServerRecord};
use crate::pagination::Page;

/// Result type for repository operations
pub type RepoResult<T> = std::result::Result<T, StorageError>;

/// Failures reported by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Uniqueness violation on (name, version)
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Conditional write lost against a concurrent writer; safe to retry
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// A multi-write commit stopped half way
    #[error("Partial commit: {0}")]
    PartialCommit(String),

    #[error("Storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Server record storage port
///
/// Backends must keep a stable total order over records (insertion
/// sequence) and honour the cursor contract in [`crate::pagination`].
#[async_trait]
pub trait ServerRepository: Send + Sync {
    /// List records matching `filter`, strictly after `cursor`, at most `limit`
    async fn list(
        &self,
        filter: &ServerFilter,
        cursor: Option<&str>,
        limit: usize,
    ) -> RepoResult<Page<ServerRecord>>;

    /// Get the latest version of the logical server with this identity
    async fn get_by_id(&self, id: &Uuid) -> RepoResult<Option<ServerRecord>>;

    /// Get one specific version of the logical server with this identity
    async fn get_by_id_and_version(
        &self,
        id: &Uuid,
        version: &str,
    ) -> RepoResult<Option<ServerRecord>>;

    /// Insert a new version. Fails with `AlreadyExists` on a duplicate (name, version).
    async fn create_server(&self, record: &ServerRecord) -> RepoResult<ServerRecord>;

    /// Replace the stored version `(id, record.version)`.
    async fn update_server(&self, id: &Uuid, record: &ServerRecord) -> RepoResult<ServerRecord>;

    /// Count versions published by `subject` within the trailing `hours`
    async fn count_recent_publishes_by_subject(&self, subject: &str, hours: u32)
        -> RepoResult<u64>;

    /// Commit a new version and, optionally, demote the previous latest.
    ///
    /// The default runs the two writes back to back and reports
    /// `PartialCommit` when the demotion fails after the create landed.
    /// Backends with transactions override this to commit atomically and to
    /// return `Conflict` when `demote` is no longer the stored latest.
    async fn commit_version(
        &self,
        record: &ServerRecord,
        demote: Option<&ServerRecord>,
    ) -> RepoResult<ServerRecord> {
        let created = self.create_server(record).await?;

        if let Some(previous) = demote {
            if let Err(e) = self.update_server(&previous.id(), previous).await {
                return Err(StorageError::PartialCommit(format!(
                    "created {} {} but failed to demote {}: {}",
                    record.name(),
                    record.version(),
                    previous.version(),
                    e
                )));
            }
        }

        Ok(created)
    }

    /// Release backend resources; later calls fail
    async fn close(&self) -> RepoResult<()>;
}
