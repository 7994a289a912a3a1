//! ServerRecord entity - one stored version of a logical server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::{RegistryExtensions, ServerJson};

/// Opaque publisher-supplied metadata stored next to a manifest
pub type PublisherExtensions = serde_json::Map<String, serde_json::Value>;

/// Stored record: manifest + registry metadata + publisher extension bag.
///
/// One record exists per (identity, version). Records are never overwritten
/// by a new version; only `is_latest` and `updated_at` change after creation
/// (plus administrative edits of the manifest itself).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerRecord {
    #[serde(flatten)]
    pub server: ServerJson,

    #[serde(rename = "registryExtensions")]
    pub registry: RegistryExtensions,

    #[serde(
        rename = "publisherExtensions",
        default,
        skip_serializing_if = "serde_json::Map::is_empty"
    )]
    pub publisher_extensions: PublisherExtensions,

    /// Authenticated subject that published this version (rate-limit accounting).
    /// Persisted by backends in their own column, never part of the public document.
    #[serde(skip)]
    pub published_by: Option<String>,
}

impl ServerRecord {
    pub fn new(server: ServerJson, registry: RegistryExtensions) -> Self {
        Self {
            server,
            registry,
            publisher_extensions: PublisherExtensions::new(),
            published_by: None,
        }
    }

    pub fn with_publisher_extensions(mut self, extensions: PublisherExtensions) -> Self {
        self.publisher_extensions = extensions;
        self
    }

    pub fn with_published_by(mut self, subject: impl Into<String>) -> Self {
        self.published_by = Some(subject.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.registry.id
    }

    pub fn name(&self) -> &str {
        &self.server.name
    }

    pub fn version(&self) -> &str {
        &self.server.version
    }

    pub fn is_latest(&self) -> bool {
        self.registry.is_latest
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.registry.published_at
    }

    /// Copy of this record demoted from latest at `now`.
    pub fn demoted(&self, now: DateTime<Utc>) -> Self {
        let mut record = self.clone();
        record.registry.is_latest = false;
        record.registry.updated_at = now;
        record
    }
}

/// Authenticated caller of a publish or edit, supplied by the auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    /// Stable per-publisher identifier
    pub subject: String,

    /// Holds global permissions (bypasses rate limits)
    pub is_admin: bool,
}

impl Publisher {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_admin: false,
        }
    }

    pub fn admin(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_admin: true,
        }
    }
}
