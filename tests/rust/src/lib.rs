//! Shared test utilities and fixtures for MCP registry integration tests.

pub use mcp_registry_core::domain::{DomainEvent, Publisher, ServerFilter, ServerRecord};
pub use mcp_registry_core::registry::{Remote, ServerJson};

pub use mocks::{ContendedRepository, FailingDemotionRepository, SlowRepository};

/// Install the test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = mcp_registry_core::logging::init_test_logging();
}

/// Event testing utilities
pub mod events {
    use mcp_registry_core::event_bus::EventReceiver;
    use mcp_registry_core::DomainEvent;

    /// Drain every event already queued on the receiver
    pub fn drain(rx: &mut EventReceiver) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Event type names in emission order
    pub fn type_names(events: &[DomainEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.type_name()).collect()
    }
}

/// Test fixture utilities
pub mod fixtures {
    use super::*;
    use mcp_registry_core::config::RegistryConfig;
    use mcp_registry_core::registry::RegistryExtensions;
    use mcp_registry_core::{RegistryService, RegistryServiceBuilder, ServerRepository};
    use std::sync::Arc;

    /// Repository URL attached to every fixture manifest
    pub const REPOSITORY_URL: &str = "https://github.com/example/mcp-server";

    /// A structurally valid manifest with no packages or remotes
    pub fn server(name: &str, version: &str) -> ServerJson {
        ServerJson::new(name, version)
            .with_description("Test server")
            .with_repository(REPOSITORY_URL, "github")
    }

    /// A valid manifest advertising one streamable-http remote
    pub fn remote_server(name: &str, version: &str, url: &str) -> ServerJson {
        server(name, version).with_remote(Remote::streamable_http(url))
    }

    /// A non-latest record of `subject` stamped `hours` in the past
    pub fn published_hours_ago(
        name: &str,
        version: &str,
        subject: &str,
        hours: i64,
    ) -> ServerRecord {
        let at = chrono::Utc::now() - chrono::Duration::hours(hours);
        ServerRecord::new(
            server(name, version),
            RegistryExtensions::new(uuid::Uuid::new_v4(), at, false),
        )
        .with_published_by(subject)
    }

    pub fn alice() -> Publisher {
        Publisher::new("alice")
    }

    pub fn bob() -> Publisher {
        Publisher::new("bob")
    }

    pub fn admin() -> Publisher {
        Publisher::admin("registry-admin")
    }

    /// Config with publishing effectively unlimited
    pub fn unlimited_config() -> RegistryConfig {
        RegistryConfig::default().with_daily_publish_quota(-1)
    }

    /// Service over `repo` with the structural validator
    pub fn service(repo: Arc<dyn ServerRepository>, config: RegistryConfig) -> RegistryService {
        RegistryServiceBuilder::new()
            .with_repository(repo)
            .with_config(config)
            .build()
            .expect("repository is set")
    }
}

/// Database test helpers
pub mod db {
    use mcp_registry_storage::{Database, SqliteServerRepository};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    /// Database file name
    const DB_FILE: &str = "mcp-registry.db";

    /// Create a temporary database for testing
    pub struct TestDatabase {
        pub db: Arc<Mutex<Database>>,
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestDatabase {
        /// Create a new test database in a temporary directory
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db_path = temp_dir.path().join(DB_FILE);
            let db = Database::open(&db_path).expect("Failed to open test database");
            Self {
                db: Arc::new(Mutex::new(db)),
                db_path,
                _temp_dir: temp_dir,
            }
        }

        /// Create an in-memory database for fast tests
        pub fn in_memory() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db = Database::open_in_memory().expect("Failed to open in-memory database");
            Self {
                db: Arc::new(Mutex::new(db)),
                db_path: PathBuf::new(),
                _temp_dir: temp_dir,
            }
        }

        /// A server repository over this database
        pub fn repository(&self) -> Arc<SqliteServerRepository> {
            Arc::new(SqliteServerRepository::new(self.db.clone()))
        }

        /// Get the database directory path
        pub fn path(&self) -> &Path {
            self._temp_dir.path()
        }

        /// Get the full database file path
        pub fn db_path(&self) -> &Path {
            &self.db_path
        }
    }

    impl Default for TestDatabase {
        fn default() -> Self {
            Self::new()
        }
    }
}
