//! In-memory implementation of ServerRepository.
//!
//! Records live in insertion order under a single `RwLock`; the position
//! counter doubles as the pagination sequence. `commit_version` runs all of
//! its checks and writes under one write lock, so it is atomic.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use mcp_registry_core::pagination::paginate;
use mcp_registry_core::{
    Page, RepoResult, ServerFilter, ServerRecord, ServerRepository, StorageError,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct State {
    next_seq: u64,
    records: Vec<(u64, ServerRecord)>,
}

impl State {
    fn find(&self, id: &Uuid, version: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|(_, r)| r.id() == *id && r.version() == version)
    }

    fn insert(&mut self, record: &ServerRecord) -> RepoResult<()> {
        if self
            .records
            .iter()
            .any(|(_, r)| r.name() == record.name() && r.version() == record.version())
        {
            return Err(StorageError::AlreadyExists(format!(
                "{} {}",
                record.name(),
                record.version()
            )));
        }
        if record.is_latest()
            && self
                .records
                .iter()
                .any(|(_, r)| r.name() == record.name() && r.is_latest())
        {
            return Err(StorageError::Conflict(format!(
                "{} already has a latest version",
                record.name()
            )));
        }

        self.next_seq += 1;
        self.records.push((self.next_seq, record.clone()));
        Ok(())
    }
}

/// Repository backed by a `Vec`, for tests and embedded use
#[derive(Default)]
pub struct InMemoryServerRepository {
    state: RwLock<State>,
    closed: AtomicBool,
}

impl InMemoryServerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions across all servers
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_open(&self) -> RepoResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Backend(anyhow::anyhow!(
                "server repository is closed"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ServerRepository for InMemoryServerRepository {
    async fn list(
        &self,
        filter: &ServerFilter,
        cursor: Option<&str>,
        limit: usize,
    ) -> RepoResult<Page<ServerRecord>> {
        self.ensure_open()?;
        let state = self.state.read().await;

        paginate(
            state
                .records
                .iter()
                .filter(|(_, r)| filter.matches(r))
                .cloned(),
            cursor,
            limit,
        )
    }

    async fn get_by_id(&self, id: &Uuid) -> RepoResult<Option<ServerRecord>> {
        self.ensure_open()?;
        let state = self.state.read().await;

        let versions = state.records.iter().filter(|(_, r)| r.id() == *id);
        let latest = versions
            .clone()
            .find(|(_, r)| r.is_latest())
            .or_else(|| versions.last());

        Ok(latest.map(|(_, r)| r.clone()))
    }

    async fn get_by_id_and_version(
        &self,
        id: &Uuid,
        version: &str,
    ) -> RepoResult<Option<ServerRecord>> {
        self.ensure_open()?;
        let state = self.state.read().await;

        Ok(state.find(id, version).map(|i| state.records[i].1.clone()))
    }

    async fn create_server(&self, record: &ServerRecord) -> RepoResult<ServerRecord> {
        self.ensure_open()?;
        self.state.write().await.insert(record)?;
        Ok(record.clone())
    }

    async fn update_server(&self, id: &Uuid, record: &ServerRecord) -> RepoResult<ServerRecord> {
        self.ensure_open()?;
        let mut state = self.state.write().await;

        let index = state.find(id, record.version()).ok_or_else(|| {
            StorageError::NotFound(format!("server {} version {}", id, record.version()))
        })?;
        let seq = state.records[index].0;
        state.records[index] = (seq, record.clone());

        Ok(record.clone())
    }

    async fn count_recent_publishes_by_subject(
        &self,
        subject: &str,
        hours: u32,
    ) -> RepoResult<u64> {
        self.ensure_open()?;
        let cutoff = Utc::now() - chrono::Duration::hours(i64::from(hours));
        let state = self.state.read().await;

        let count = state
            .records
            .iter()
            .filter(|(_, r)| {
                r.published_by.as_deref() == Some(subject) && r.published_at() >= cutoff
            })
            .count();

        Ok(count as u64)
    }

    async fn commit_version(
        &self,
        record: &ServerRecord,
        demote: Option<&ServerRecord>,
    ) -> RepoResult<ServerRecord> {
        self.ensure_open()?;
        let mut state = self.state.write().await;

        if let Some((_, owner)) = state.records.iter().find(|(_, r)| r.name() == record.name()) {
            if owner.id() != record.id() {
                return Err(StorageError::Conflict(format!(
                    "{} is owned by identity {}",
                    record.name(),
                    owner.id()
                )));
            }
        }

        let demote_index = match demote {
            Some(previous) => {
                let index = state
                    .find(&previous.id(), previous.version())
                    .filter(|&i| state.records[i].1.is_latest())
                    .ok_or_else(|| {
                        StorageError::Conflict(format!(
                            "{} {} is no longer the latest version",
                            previous.name(),
                            previous.version()
                        ))
                    })?;
                Some((index, previous))
            }
            None => None,
        };

        // Demote before inserting so the single-latest check sees the new state;
        // restore it if the insert fails.
        let saved = demote_index.map(|(index, previous)| {
            let seq = state.records[index].0;
            let old = std::mem::replace(&mut state.records[index], (seq, previous.clone()));
            (index, old)
        });

        if let Err(e) = state.insert(record) {
            if let Some((index, old)) = saved {
                state.records[index] = old;
            }
            return Err(e);
        }

        debug!(
            name = %record.name(),
            version = %record.version(),
            demoted = ?demote.map(|d| d.version()),
            "[InMemoryServerRepository] Committed version"
        );
        Ok(record.clone())
    }

    async fn close(&self) -> RepoResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
