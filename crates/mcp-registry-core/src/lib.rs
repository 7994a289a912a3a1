//! # MCP Registry Core Library
//!
//! Publish-and-consistency engine for a registry of MCP server manifests.
//!
//! ## Modules
//!
//! - `registry` - Manifest schema, registry metadata and the validation port
//! - `domain` - Stored records, filters, publishers and domain events
//! - `version` - Version precedence (semver with timestamp fallback)
//! - `pagination` - Opaque cursor protocol shared by storage backends
//! - `repository` - Storage port and the deadline decorator
//! - `service` - Rate limiter and duplicate remote URL guard
//! - `application` - Publish orchestrator with event emission
//! - `event_bus` - Central event distribution system
//! - `config` / `logging` - Environment configuration and tracing setup

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod event_bus;
pub mod logging;
pub mod pagination;
pub mod registry;
pub mod repository;
pub mod service;
pub mod version;

// Re-export commonly used types
pub use domain::*;
pub use error::{RegistryError, RegistryResult};
pub use repository::*;
pub use service::*;

// Event-driven architecture exports
pub use application::{PublishRequest, RegistryService, RegistryServiceBuilder};
pub use config::RegistryConfig;
pub use event_bus::{EventBus, EventReceiver, EventSender, SharedEventBus};
pub use pagination::{Cursor, Page};
