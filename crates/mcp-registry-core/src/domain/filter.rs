//! Typed list filter understood by every storage backend

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ServerRecord;

/// Closed set of list filters. All set fields must match (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerFilter {
    /// Exact server name
    pub name: Option<String>,

    /// Exact version string
    pub version: Option<String>,

    /// Registry identity
    pub id: Option<Uuid>,

    /// Record advertises this exact remote URL
    pub remote_url: Option<String>,

    pub is_latest: Option<bool>,

    /// `updated_at` strictly after this instant
    pub updated_since: Option<DateTime<Utc>>,

    /// Substring of the server name, ASCII case-insensitive
    pub name_contains: Option<String>,
}

impl ServerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new().with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn with_latest(mut self, is_latest: bool) -> Self {
        self.is_latest = Some(is_latest);
        self
    }

    pub fn with_updated_since(mut self, since: DateTime<Utc>) -> Self {
        self.updated_since = Some(since);
        self
    }

    pub fn with_name_contains(mut self, fragment: impl Into<String>) -> Self {
        self.name_contains = Some(fragment.into());
        self
    }

    /// Evaluate the filter against a record.
    ///
    /// Backends that cannot push a filter down to their query engine apply
    /// it with this method so every backend agrees on the semantics.
    pub fn matches(&self, record: &ServerRecord) -> bool {
        if let Some(name) = &self.name {
            if record.name() != name {
                return false;
            }
        }
        if let Some(version) = &self.version {
            if record.version() != version {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if record.id() != *id {
                return false;
            }
        }
        if let Some(url) = &self.remote_url {
            if !record.server.remote_urls().any(|u| u == url) {
                return false;
            }
        }
        if let Some(is_latest) = self.is_latest {
            if record.is_latest() != is_latest {
                return false;
            }
        }
        if let Some(since) = self.updated_since {
            if record.registry.updated_at <= since {
                return false;
            }
        }
        if let Some(fragment) = &self.name_contains {
            // ASCII folding only, matching SQLite's lower()
            if !record
                .name()
                .to_ascii_lowercase()
                .contains(&fragment.to_ascii_lowercase())
            {
                return false;
            }
        }
        true
    }
}
