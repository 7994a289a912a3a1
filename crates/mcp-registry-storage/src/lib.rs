//! MCP Registry Storage Layer
//!
//! Backends for the registry's [`ServerRepository`] storage port.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 RegistryService                      │
//! ├──────────────────────────────────────────────────────┤
//! │        ServerRepository (storage port, core)         │
//! ├───────────────────────────┬──────────────────────────┤
//! │  SqliteServerRepository   │ InMemoryServerRepository │
//! │  (JSON document + index   │ (Vec under RwLock)       │
//! │   columns, transactions)  │                          │
//! ├───────────────────────────┴──────────────────────────┤
//! │                   Database                           │
//! │            (SQLite, WAL, migrations)                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcp_registry_core::RegistryConfig;
//! use mcp_registry_storage::{Database, SqliteServerRepository};
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let config = RegistryConfig::from_env()?;
//! let db = Database::open_configured(&config)?;
//! let repo = Arc::new(SqliteServerRepository::new(Arc::new(Mutex::new(db))));
//! ```
//!
//! [`ServerRepository`]: mcp_registry_core::ServerRepository

mod database;
mod memory;
mod repositories;

pub use database::Database;
pub use memory::InMemoryServerRepository;
pub use repositories::*;

use std::path::PathBuf;

/// Default database file name.
pub const DATABASE_FILE: &str = "mcp-registry.db";

/// Get the default database path for the current platform.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("mcp-registry").join(DATABASE_FILE))
}

/// Database path from configuration, falling back to the platform default.
pub fn resolve_database_path(configured: Option<&PathBuf>) -> Option<PathBuf> {
    configured.cloned().or_else(default_database_path)
}
