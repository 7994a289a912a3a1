//! SQLite implementation of ServerRepository.
//!
//! Each version is one row: the full record as a JSON document plus indexed
//! columns for the fields the engine filters on. Pagination follows the
//! AUTOINCREMENT `seq` column.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mcp_registry_core::pagination::Cursor;
use mcp_registry_core::{
    Page, RepoResult, ServerFilter, ServerRecord, ServerRepository, StorageError,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::Database;

/// SQLite-backed implementation of ServerRepository.
pub struct SqliteServerRepository {
    db: Arc<Mutex<Database>>,
    closed: AtomicBool,
}

impl SqliteServerRepository {
    /// Create a new SQLite server repository.
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self {
            db,
            closed: AtomicBool::new(false),
        }
    }

    /// Standard column list for SELECT queries
    const SELECT_COLUMNS: &'static str = "seq, document, published_by";

    /// Fixed-width RFC3339 so text comparison orders like time.
    fn timestamp(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Map a row to `(seq, ServerRecord)`
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<(u64, ServerRecord)> {
        let seq: i64 = row.get(0)?;
        let document: String = row.get(1)?;
        let published_by: Option<String> = row.get(2)?;

        let mut record: ServerRecord = serde_json::from_str(&document).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        record.published_by = published_by;

        Ok((seq as u64, record))
    }

    /// Lock the database, failing once the repository is closed.
    async fn lock(&self) -> RepoResult<MutexGuard<'_, Database>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Backend(anyhow::anyhow!(
                "server repository is closed"
            )));
        }
        Ok(self.db.lock().await)
    }

    fn query_page(
        conn: &Connection,
        filter: &ServerFilter,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<(u64, ServerRecord)>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(after) = after {
            clauses.push("seq > ?");
            args.push(Value::Integer(i64::try_from(after).unwrap_or(i64::MAX)));
        }
        if let Some(name) = &filter.name {
            clauses.push("server_name = ?");
            args.push(Value::Text(name.clone()));
        }
        if let Some(version) = &filter.version {
            clauses.push("version = ?");
            args.push(Value::Text(version.clone()));
        }
        if let Some(id) = &filter.id {
            clauses.push("server_id = ?");
            args.push(Value::Text(id.to_string()));
        }
        if let Some(url) = &filter.remote_url {
            clauses.push(
                "EXISTS (SELECT 1 FROM json_each(servers.document, '$.remotes') AS r
                         WHERE json_extract(r.value, '$.url') = ?)",
            );
            args.push(Value::Text(url.clone()));
        }
        if let Some(is_latest) = filter.is_latest {
            clauses.push("is_latest = ?");
            args.push(Value::Integer(i64::from(is_latest)));
        }
        if let Some(since) = &filter.updated_since {
            clauses.push("updated_at > ?");
            args.push(Value::Text(Self::timestamp(since)));
        }
        if let Some(fragment) = &filter.name_contains {
            clauses.push("instr(lower(server_name), lower(?)) > 0");
            args.push(Value::Text(fragment.clone()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        args.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM servers {} ORDER BY seq ASC LIMIT ?",
            Self::SELECT_COLUMNS,
            where_clause
        ))?;

        let rows = stmt
            .query_map(params_from_iter(args.iter()), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn insert(conn: &Connection, record: &ServerRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO servers (server_id, server_name, version, is_latest, published_at, updated_at, published_by, document)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id().to_string(),
                record.name(),
                record.version(),
                record.is_latest(),
                Self::timestamp(&record.registry.published_at),
                Self::timestamp(&record.registry.updated_at),
                record.published_by.as_deref(),
                serde_json::to_string(record)?,
            ],
        )?;
        Ok(())
    }

    fn update(conn: &Connection, id: &Uuid, record: &ServerRecord) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE servers SET server_name = ?1, is_latest = ?2, updated_at = ?3, document = ?4
             WHERE server_id = ?5 AND version = ?6",
            params![
                record.name(),
                record.is_latest(),
                Self::timestamp(&record.registry.updated_at),
                serde_json::to_string(record)?,
                id.to_string(),
                record.version(),
            ],
        )?;
        Ok(changed)
    }

    /// Atomic body of `commit_version`; runs inside a transaction.
    fn commit(conn: &Connection, record: &ServerRecord, demote: Option<&ServerRecord>) -> Result<()> {
        let owner: Option<String> = conn
            .query_row(
                "SELECT server_id FROM servers WHERE server_name = ?1 ORDER BY seq ASC LIMIT 1",
                [record.name()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(owner) = owner {
            if owner != record.id().to_string() {
                return Err(StorageError::Conflict(format!(
                    "{} is owned by identity {}",
                    record.name(),
                    owner
                ))
                .into());
            }
        }

        if let Some(previous) = demote {
            let changed = conn.execute(
                "UPDATE servers SET is_latest = 0, updated_at = ?1, document = ?2
                 WHERE server_id = ?3 AND version = ?4 AND is_latest = 1",
                params![
                    Self::timestamp(&previous.registry.updated_at),
                    serde_json::to_string(previous)?,
                    previous.id().to_string(),
                    previous.version(),
                ],
            )?;
            if changed == 0 {
                return Err(StorageError::Conflict(format!(
                    "{} {} is no longer the latest version",
                    previous.name(),
                    previous.version()
                ))
                .into());
            }
        }

        Self::insert(conn, record)
    }
}

/// Map an error from a SQLite call onto the storage port's vocabulary.
fn classify(err: anyhow::Error) -> StorageError {
    let err = match err.downcast::<StorageError>() {
        Ok(storage) => return storage,
        Err(err) => err,
    };

    if let Some(rusqlite::Error::SqliteFailure(failure, message)) =
        err.downcast_ref::<rusqlite::Error>()
    {
        if failure.code == ErrorCode::ConstraintViolation {
            let message = message.clone().unwrap_or_else(|| failure.to_string());
            // UNIQUE(server_name, version) names both columns; the
            // single-latest index names only server_name.
            return if message.contains("servers.version") {
                StorageError::AlreadyExists(message)
            } else {
                StorageError::Conflict(message)
            };
        }
    }

    StorageError::Backend(err)
}

#[async_trait]
impl ServerRepository for SqliteServerRepository {
    async fn list(
        &self,
        filter: &ServerFilter,
        cursor: Option<&str>,
        limit: usize,
    ) -> RepoResult<Page<ServerRecord>> {
        let after = Cursor::decode_opt(cursor)?.map(|c| c.sequence());
        let db = self.lock().await?;

        let rows = Self::query_page(db.connection(), filter, after, limit).map_err(classify)?;

        Ok(Page::from_sequenced(rows, limit))
    }

    async fn get_by_id(&self, id: &Uuid) -> RepoResult<Option<ServerRecord>> {
        let db = self.lock().await?;
        let conn = db.connection();

        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM servers WHERE server_id = ?1 ORDER BY is_latest DESC, seq DESC LIMIT 1",
                    Self::SELECT_COLUMNS
                ),
                [id.to_string()],
                Self::map_row,
            )
            .optional()
            .map_err(|e| classify(e.into()))?;

        Ok(record.map(|(_, r)| r))
    }

    async fn get_by_id_and_version(
        &self,
        id: &Uuid,
        version: &str,
    ) -> RepoResult<Option<ServerRecord>> {
        let db = self.lock().await?;
        let conn = db.connection();

        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM servers WHERE server_id = ?1 AND version = ?2",
                    Self::SELECT_COLUMNS
                ),
                params![id.to_string(), version],
                Self::map_row,
            )
            .optional()
            .map_err(|e| classify(e.into()))?;

        Ok(record.map(|(_, r)| r))
    }

    async fn create_server(&self, record: &ServerRecord) -> RepoResult<ServerRecord> {
        let db = self.lock().await?;

        Self::insert(db.connection(), record).map_err(classify)?;

        debug!(
            name = %record.name(),
            version = %record.version(),
            "[SqliteServerRepository] Inserted version"
        );
        Ok(record.clone())
    }

    async fn update_server(&self, id: &Uuid, record: &ServerRecord) -> RepoResult<ServerRecord> {
        let db = self.lock().await?;

        let changed = Self::update(db.connection(), id, record).map_err(classify)?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!(
                "server {} version {}",
                id,
                record.version()
            )));
        }

        Ok(record.clone())
    }

    async fn count_recent_publishes_by_subject(
        &self,
        subject: &str,
        hours: u32,
    ) -> RepoResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::hours(i64::from(hours));
        let db = self.lock().await?;

        let count: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM servers WHERE published_by = ?1 AND published_at >= ?2",
                params![subject, Self::timestamp(&cutoff)],
                |row| row.get(0),
            )
            .map_err(|e| classify(e.into()))?;

        Ok(count.max(0) as u64)
    }

    async fn commit_version(
        &self,
        record: &ServerRecord,
        demote: Option<&ServerRecord>,
    ) -> RepoResult<ServerRecord> {
        let db = self.lock().await?;

        db.transaction(|conn| Self::commit(conn, record, demote))
            .map_err(classify)?;

        debug!(
            name = %record.name(),
            version = %record.version(),
            demoted = ?demote.map(|d| d.version()),
            "[SqliteServerRepository] Committed version"
        );
        Ok(record.clone())
    }

    async fn close(&self) -> RepoResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let db = self.db.lock().await;
        db.connection()
            .execute_batch("PRAGMA optimize;")
            .map_err(|e| classify(e.into()))?;

        info!("[SqliteServerRepository] Closed");
        Ok(())
    }
}
