//! Registry Application Service
//!
//! Publishes, edits and serves server manifests. Publishing runs a fixed
//! sequence of gates and then commits through the storage port:
//!
//! 1. quota gate (publishing disabled / rate limit, admins bypass)
//! 2. structural checks and the pluggable [`Validator`]
//! 3. duplicate remote URL guard
//! 4. lookup of every existing version of the name
//! 5. version uniqueness, 6. version ceiling
//! 7. identity: reuse the id of the earliest-published version
//! 8. latest decision via [`crate::version::compare_versions`]
//! 9. commit the new record and demote the previous latest
//!
//! Steps 4-9 are retried when the backend reports a lost conditional write,
//! so concurrent publishes of one name converge on one identity and one
//! latest version.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::domain::{DomainEvent, Publisher, PublisherExtensions, ServerFilter, ServerRecord};
use crate::error::{RegistryError, RegistryResult};
use crate::event_bus::{EventReceiver, EventSender, SharedEventBus};
use crate::pagination::{collect_all, Page};
use crate::registry::{RegistryExtensions, ServerJson, Validator};
use crate::repository::{DeadlineRepository, ServerRepository, StorageError};
use crate::service::{RateLimiter, RemoteUrlGuard};
use crate::version::is_newer;

/// Attempts of the lookup/decide/commit sequence before giving up on conflicts
pub const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Page size used when reading every version of one server
const VERSION_LOOKUP_PAGE_SIZE: usize = 1000;

/// Manifest plus the optional publisher extension bag
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub server: ServerJson,
    pub publisher_extensions: PublisherExtensions,
}

impl PublishRequest {
    pub fn new(server: ServerJson) -> Self {
        Self {
            server,
            publisher_extensions: PublisherExtensions::new(),
        }
    }

    pub fn with_publisher_extensions(mut self, extensions: PublisherExtensions) -> Self {
        self.publisher_extensions = extensions;
        self
    }
}

impl From<ServerJson> for PublishRequest {
    fn from(server: ServerJson) -> Self {
        Self::new(server)
    }
}

/// Application service for publishing and reading server manifests
pub struct RegistryService {
    repo: Arc<dyn ServerRepository>,
    validator: Arc<dyn Validator>,
    rate_limiter: RateLimiter,
    remote_guard: RemoteUrlGuard,
    config: RegistryConfig,
    event_bus: SharedEventBus,
    event_sender: EventSender,
}

impl RegistryService {
    /// Every storage call goes through a [`DeadlineRepository`] bounded by
    /// `config.storage_timeout`.
    pub fn new(
        repo: Arc<dyn ServerRepository>,
        validator: Arc<dyn Validator>,
        config: RegistryConfig,
        event_bus: SharedEventBus,
    ) -> Self {
        let repo: Arc<dyn ServerRepository> =
            Arc::new(DeadlineRepository::new(repo, config.storage_timeout));
        let event_sender = event_bus.sender();
        if config.publishing_disabled() {
            info!("[RegistryService] Publishing disabled for non-admin subjects");
        }

        Self {
            rate_limiter: RateLimiter::new(repo.clone(), config.daily_publish_quota),
            remote_guard: RemoteUrlGuard::new(repo.clone()),
            repo,
            validator,
            config,
            event_bus,
            event_sender,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Subscribe to events emitted by this service
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    /// Publish a new version of a server
    ///
    /// Emits: `ServerPublished`, and `LatestVersionChanged` when the new
    /// version becomes latest
    pub async fn publish(
        &self,
        request: impl Into<PublishRequest>,
        publisher: &Publisher,
    ) -> RegistryResult<ServerRecord> {
        let PublishRequest {
            server,
            publisher_extensions,
        } = request.into();

        self.rate_limiter
            .check(&publisher.subject, publisher.is_admin)
            .await?;

        self.check_manifest(&server, &publisher_extensions).await?;

        let mut last_conflict = String::new();
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            match self
                .try_commit(&server, &publisher_extensions, publisher)
                .await
            {
                Ok(record) => return Ok(record),
                Err(CommitError::Retry(reason)) => {
                    warn!(
                        name = %server.name,
                        version = %server.version,
                        attempt = attempt,
                        reason = %reason,
                        "[RegistryService] Commit lost a concurrent write, retrying"
                    );
                    last_conflict = reason;
                }
                Err(CommitError::Fatal(e)) => return Err(e),
            }
        }

        Err(RegistryError::Storage(StorageError::Conflict(format!(
            "{} {}: gave up after {} attempts: {}",
            server.name, server.version, MAX_COMMIT_ATTEMPTS, last_conflict
        ))))
    }

    /// One pass of lookup, decide and commit.
    async fn try_commit(
        &self,
        server: &ServerJson,
        publisher_extensions: &PublisherExtensions,
        publisher: &Publisher,
    ) -> Result<ServerRecord, CommitError> {
        let max_versions = self.config.max_versions_per_server;
        let existing = collect_all(
            self.repo.as_ref(),
            &ServerFilter::by_name(&server.name),
            VERSION_LOOKUP_PAGE_SIZE.min(max_versions.max(1)),
            max_versions.max(1),
        )
        .await
        .map_err(|e| CommitError::Fatal(e.into()))?;

        if existing.iter().any(|r| r.version() == server.version) {
            return Err(CommitError::Fatal(RegistryError::InvalidVersion(format!(
                "version {} of {} already exists",
                server.version, server.name
            ))));
        }

        if existing.len() >= max_versions {
            return Err(CommitError::Fatal(RegistryError::MaxVersionsReached {
                name: server.name.clone(),
                max: max_versions,
            }));
        }

        let id = existing
            .iter()
            .min_by_key(|r| r.published_at())
            .map(|r| r.id())
            .unwrap_or_else(Uuid::new_v4);

        let now = Utc::now();
        let current_latest = existing.iter().find(|r| r.is_latest());
        let is_latest = match current_latest {
            None => true,
            Some(latest) => is_newer(
                &server.version,
                now,
                latest.version(),
                latest.published_at(),
            ),
        };

        let record = ServerRecord::new(server.clone(), RegistryExtensions::new(id, now, is_latest))
            .with_publisher_extensions(publisher_extensions.clone())
            .with_published_by(&publisher.subject);
        let demote = if is_latest {
            current_latest.map(|latest| latest.demoted(now))
        } else {
            None
        };

        debug!(
            name = %server.name,
            version = %server.version,
            server_id = %id,
            existing_versions = existing.len(),
            is_latest = is_latest,
            "[RegistryService] Committing version"
        );

        let created = match self.repo.commit_version(&record, demote.as_ref()).await {
            Ok(created) => created,
            Err(StorageError::Conflict(reason)) | Err(StorageError::AlreadyExists(reason)) => {
                return Err(CommitError::Retry(reason));
            }
            Err(e) => {
                if matches!(e, StorageError::PartialCommit(_)) {
                    warn!(
                        name = %server.name,
                        version = %server.version,
                        error = %e,
                        "[RegistryService] Publish left a partial commit"
                    );
                }
                return Err(CommitError::Fatal(e.into()));
            }
        };

        info!(
            name = %created.name(),
            version = %created.version(),
            server_id = %created.id(),
            is_latest = created.is_latest(),
            subject = %publisher.subject,
            "[RegistryService] Published server"
        );

        self.event_sender.emit(DomainEvent::ServerPublished {
            server_id: created.id(),
            name: created.name().to_string(),
            version: created.version().to_string(),
            is_latest: created.is_latest(),
            published_by: publisher.subject.clone(),
            published_at: created.published_at(),
        });
        if created.is_latest() {
            self.event_sender.emit(DomainEvent::LatestVersionChanged {
                server_id: created.id(),
                name: created.name().to_string(),
                previous_version: demote.map(|d| d.version().to_string()),
                current_version: created.version().to_string(),
            });
        }

        Ok(created)
    }

    /// Replace the manifest of an existing version in place
    ///
    /// Version ordering and the latest flag are left untouched.
    ///
    /// Emits: `ServerEdited`
    pub async fn edit_server(
        &self,
        id: &Uuid,
        request: impl Into<PublishRequest>,
        editor: &Publisher,
    ) -> RegistryResult<ServerRecord> {
        let PublishRequest {
            server,
            publisher_extensions,
        } = request.into();

        self.check_manifest(&server, &publisher_extensions).await?;

        let existing = self
            .repo
            .get_by_id_and_version(id, &server.version)
            .await?
            .ok_or_else(|| {
                RegistryError::NotFound(format!("server {} version {}", id, server.version))
            })?;

        if existing.name() != server.name {
            return Err(RegistryError::InvalidInput(format!(
                "cannot rename '{}' to '{}' by editing",
                existing.name(),
                server.name
            )));
        }

        let mut updated = existing;
        updated.server = server;
        updated.registry.updated_at = Utc::now();
        if !publisher_extensions.is_empty() {
            updated.publisher_extensions = publisher_extensions;
        }

        let saved = self.repo.update_server(id, &updated).await?;

        info!(
            server_id = %id,
            name = %saved.name(),
            version = %saved.version(),
            editor = %editor.subject,
            "[RegistryService] Edited server"
        );

        self.event_sender.emit(DomainEvent::ServerEdited {
            server_id: *id,
            name: saved.name().to_string(),
            version: saved.version().to_string(),
            edited_by: editor.subject.clone(),
        });

        Ok(saved)
    }

    /// List records matching `filter`; `limit` 0 means the default page size
    pub async fn list(
        &self,
        filter: &ServerFilter,
        cursor: Option<&str>,
        limit: usize,
    ) -> RegistryResult<Page<ServerRecord>> {
        let limit = self.config.page_size(limit);
        Ok(self.repo.list(filter, cursor, limit).await?)
    }

    /// Latest version of the server with this identity
    pub async fn get_by_id(&self, id: &Uuid) -> RegistryResult<ServerRecord> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("server {}", id)))
    }

    /// One specific version of the server with this identity
    pub async fn get_version(&self, id: &Uuid, version: &str) -> RegistryResult<ServerRecord> {
        self.repo
            .get_by_id_and_version(id, version)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("server {} version {}", id, version)))
    }

    /// Every version of a logical server, in storage order
    pub async fn list_versions(&self, name: &str) -> RegistryResult<Vec<ServerRecord>> {
        let max = self.config.max_versions_per_server.max(1);
        let versions = collect_all(
            self.repo.as_ref(),
            &ServerFilter::by_name(name),
            VERSION_LOOKUP_PAGE_SIZE.min(max),
            max,
        )
        .await?;

        if versions.is_empty() {
            return Err(RegistryError::NotFound(format!("server '{}'", name)));
        }
        Ok(versions)
    }

    /// Close the underlying storage
    pub async fn close(&self) -> RegistryResult<()> {
        Ok(self.repo.close().await?)
    }

    /// Checks shared by publish and edit, before any storage write.
    async fn check_manifest(
        &self,
        server: &ServerJson,
        publisher_extensions: &PublisherExtensions,
    ) -> RegistryResult<()> {
        server
            .check_structure()
            .map_err(RegistryError::InvalidInput)?;

        let extensions_size = serde_json::to_vec(publisher_extensions)
            .map_err(|e| RegistryError::InvalidInput(format!("publisher extensions: {}", e)))?
            .len();
        if extensions_size > self.config.max_publisher_extensions_bytes {
            return Err(RegistryError::InvalidInput(format!(
                "publisher extensions are {} bytes, limit is {}",
                extensions_size, self.config.max_publisher_extensions_bytes
            )));
        }

        self.validator
            .validate(server)
            .await
            .map_err(RegistryError::ValidationFailed)?;

        self.remote_guard.check(server).await
    }
}

/// Outcome of one commit attempt
enum CommitError {
    /// Lost a conditional write; re-read and try again
    Retry(String),
    Fatal(RegistryError),
}
