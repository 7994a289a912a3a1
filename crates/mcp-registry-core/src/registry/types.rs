//! Core value types shared by registry manifests and stored records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport used by a package or remote endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransportType {
    /// Local process via stdio
    #[default]
    Stdio,
    /// Remote server via the Streamable HTTP transport
    StreamableHttp,
    /// Remote server via Server-Sent Events (legacy)
    Sse,
}

impl TransportType {
    /// Whether this transport is reachable over the network
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Stdio)
    }
}

/// Lifecycle status of a published server version
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Active,
    Deprecated,
    Deleted,
}

/// Registry-generated metadata attached to every stored manifest.
///
/// Never accepted from clients on publish; the registry owns every field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryExtensions {
    /// Stable identity shared by every version of one logical server
    pub id: Uuid,

    pub published_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Exactly one version per logical server carries `true`
    pub is_latest: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
}

impl RegistryExtensions {
    /// Metadata for a freshly published version.
    pub fn new(id: Uuid, now: DateTime<Utc>, is_latest: bool) -> Self {
        Self {
            id,
            published_at: now,
            updated_at: now,
            is_latest,
            release_date: Some(now),
        }
    }
}
