//! Per-call deadlines for storage access.
//!
//! Every storage call made by the registry goes through
//! [`DeadlineRepository`], which fails fast with [`StorageError::Timeout`]
//! instead of blocking on a stuck backend. Timeouts are never retried here.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use super::{RepoResult, ServerRepository, StorageError};
use crate::domain::{ServerFilter, ServerRecord};
use crate::pagination::Page;

/// Decorator that bounds each call on the inner repository
pub struct DeadlineRepository {
    inner: Arc<dyn ServerRepository>,
    timeout: Duration,
}

impl DeadlineRepository {
    pub fn new(inner: Arc<dyn ServerRepository>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> RepoResult<T>
    where
        F: Future<Output = RepoResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation = operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "[Storage] Operation timed out"
                );
                Err(StorageError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl ServerRepository for DeadlineRepository {
    async fn list(
        &self,
        filter: &ServerFilter,
        cursor: Option<&str>,
        limit: usize,
    ) -> RepoResult<Page<ServerRecord>> {
        self.bounded("list", self.inner.list(filter, cursor, limit))
            .await
    }

    async fn get_by_id(&self, id: &Uuid) -> RepoResult<Option<ServerRecord>> {
        self.bounded("get_by_id", self.inner.get_by_id(id)).await
    }

    async fn get_by_id_and_version(
        &self,
        id: &Uuid,
        version: &str,
    ) -> RepoResult<Option<ServerRecord>> {
        self.bounded(
            "get_by_id_and_version",
            self.inner.get_by_id_and_version(id, version),
        )
        .await
    }

    async fn create_server(&self, record: &ServerRecord) -> RepoResult<ServerRecord> {
        self.bounded("create_server", self.inner.create_server(record))
            .await
    }

    async fn update_server(&self, id: &Uuid, record: &ServerRecord) -> RepoResult<ServerRecord> {
        self.bounded("update_server", self.inner.update_server(id, record))
            .await
    }

    async fn count_recent_publishes_by_subject(
        &self,
        subject: &str,
        hours: u32,
    ) -> RepoResult<u64> {
        self.bounded(
            "count_recent_publishes_by_subject",
            self.inner.count_recent_publishes_by_subject(subject, hours),
        )
        .await
    }

    async fn commit_version(
        &self,
        record: &ServerRecord,
        demote: Option<&ServerRecord>,
    ) -> RepoResult<ServerRecord> {
        self.bounded("commit_version", self.inner.commit_version(record, demote))
            .await
    }

    async fn close(&self) -> RepoResult<()> {
        self.bounded("close", self.inner.close()).await
    }
}
