//! Registry configuration
//!
//! Loaded from the process environment (after an optional `.env` file).
//! Every setting has a default so an empty environment yields a working
//! registry.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Environment variable names, centralised for type-safe access.
pub mod keys {
    /// Publishes per subject per rolling 24h (i64; negative = unlimited, 0 = disabled)
    pub const RATE_LIMIT_PER_DAY: &str = "MCP_REGISTRY_RATE_LIMIT_PER_DAY";
    /// Version ceiling per logical server (usize)
    pub const MAX_VERSIONS_PER_SERVER: &str = "MCP_REGISTRY_MAX_VERSIONS_PER_SERVER";
    /// Deadline for each storage call, in milliseconds (u64)
    pub const STORAGE_TIMEOUT_MS: &str = "MCP_REGISTRY_STORAGE_TIMEOUT_MS";
    /// Size cap of the serialized publisher extension bag (usize)
    pub const MAX_PUBLISHER_EXTENSIONS_BYTES: &str = "MCP_REGISTRY_MAX_PUBLISHER_EXTENSIONS_BYTES";
    /// Page size when a list request asks for 0 (usize)
    pub const DEFAULT_PAGE_SIZE: &str = "MCP_REGISTRY_DEFAULT_PAGE_SIZE";
    /// Upper bound on list page size (usize)
    pub const MAX_PAGE_SIZE: &str = "MCP_REGISTRY_MAX_PAGE_SIZE";
    /// SQLite database file
    pub const DATABASE_PATH: &str = "MCP_REGISTRY_DATABASE_PATH";
}

pub const DEFAULT_RATE_LIMIT_PER_DAY: i64 = 10;
pub const DEFAULT_MAX_VERSIONS_PER_SERVER: usize = 10_000;
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_PUBLISHER_EXTENSIONS_BYTES: usize = 4096;
pub const DEFAULT_PAGE_SIZE: usize = 30;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Tunables of the publish engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub daily_publish_quota: i64,
    pub max_versions_per_server: usize,
    pub storage_timeout: Duration,
    pub max_publisher_extensions_bytes: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub database_path: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            daily_publish_quota: DEFAULT_RATE_LIMIT_PER_DAY,
            max_versions_per_server: DEFAULT_MAX_VERSIONS_PER_SERVER,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            max_publisher_extensions_bytes: DEFAULT_MAX_PUBLISHER_EXTENSIONS_BYTES,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            database_path: None,
        }
    }
}

impl RegistryConfig {
    /// Load `.env` (if present) and read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("[Config] Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_ms: Option<u64> = parse(&lookup, keys::STORAGE_TIMEOUT_MS)?;
        let storage_timeout = timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.storage_timeout);

        Ok(Self {
            daily_publish_quota: parse(&lookup, keys::RATE_LIMIT_PER_DAY)?
                .unwrap_or(defaults.daily_publish_quota),
            max_versions_per_server: parse(&lookup, keys::MAX_VERSIONS_PER_SERVER)?
                .unwrap_or(defaults.max_versions_per_server),
            storage_timeout,
            max_publisher_extensions_bytes: parse(&lookup, keys::MAX_PUBLISHER_EXTENSIONS_BYTES)?
                .unwrap_or(defaults.max_publisher_extensions_bytes),
            default_page_size: parse(&lookup, keys::DEFAULT_PAGE_SIZE)?
                .unwrap_or(defaults.default_page_size),
            max_page_size: parse(&lookup, keys::MAX_PAGE_SIZE)?.unwrap_or(defaults.max_page_size),
            database_path: lookup(keys::DATABASE_PATH)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn with_daily_publish_quota(mut self, quota: i64) -> Self {
        self.daily_publish_quota = quota;
        self
    }

    pub fn with_max_versions_per_server(mut self, max: usize) -> Self {
        self.max_versions_per_server = max;
        self
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Publishing is off for everyone but admins
    pub fn publishing_disabled(&self) -> bool {
        self.daily_publish_quota == 0
    }

    /// Clamp a requested list limit; 0 means "use the default".
    pub fn page_size(&self, requested: usize) -> usize {
        let max = self.max_page_size.max(1);
        match requested {
            0 => self.default_page_size.clamp(1, max),
            n => n.min(max),
        }
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
