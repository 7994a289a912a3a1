//! Domain Events - registry state changes
//!
//! Emitted by the registry service after a commit succeeds. Consumers
//! (search indexers, audit logs, cache invalidation) subscribe through the
//! event bus and react; the publish path never waits on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registry domain events
///
/// Events serialize with a `type` field containing the snake_case variant name:
/// ```json
/// { "type": "server_published", "server_id": "...", "name": "...", "version": "1.0.0" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A new version was committed
    ServerPublished {
        server_id: Uuid,
        name: String,
        version: String,
        is_latest: bool,
        published_by: String,
        published_at: DateTime<Utc>,
    },

    /// The latest pointer of a logical server moved
    LatestVersionChanged {
        server_id: Uuid,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_version: Option<String>,
        current_version: String,
    },

    /// An existing version was edited in place
    ServerEdited {
        server_id: Uuid,
        name: String,
        version: String,
        edited_by: String,
    },
}

impl DomainEvent {
    /// Get the event type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ServerPublished { .. } => "server_published",
            Self::LatestVersionChanged { .. } => "latest_version_changed",
            Self::ServerEdited { .. } => "server_edited",
        }
    }

    /// Identity of the logical server the event concerns
    pub fn server_id(&self) -> Uuid {
        match self {
            Self::ServerPublished { server_id, .. }
            | Self::LatestVersionChanged { server_id, .. }
            | Self::ServerEdited { server_id, .. } => *server_id,
        }
    }

    /// Name of the logical server the event concerns
    pub fn name(&self) -> &str {
        match self {
            Self::ServerPublished { name, .. }
            | Self::LatestVersionChanged { name, .. }
            | Self::ServerEdited { name, .. } => name,
        }
    }
}
