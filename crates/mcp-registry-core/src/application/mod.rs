//! Application Services - Orchestration layer with event emission
//!
//! Application services sit between the presentation layer (HTTP handlers,
//! CLIs) and the domain layer (repositories, domain services). They:
//!
//! 1. **Orchestrate** publish and edit operations across the storage port
//! 2. **Emit events** after successful operations via the event bus
//! 3. **Validate** manifests and enforce quotas before any write
//!
//! # Architecture
//!
//! ```text
//! Presentation Layer (HTTP handlers)
//!         │
//!         ▼
//! ┌─────────────────────────────────────┐
//! │      RegistryService                │
//! │   Validator, RateLimiter,           │
//! │   RemoteUrlGuard ──► Event Bus      │
//! └────────────────┬────────────────────┘
//!                  ▼
//!     DeadlineRepository ──► ServerRepository
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let service = RegistryServiceBuilder::new()
//!     .with_repository(repo)
//!     .with_config(RegistryConfig::from_env()?)
//!     .build()?;
//!
//! let record = service.publish(server_json, &Publisher::new("alice")).await?;
//! // -> Emits ServerPublished (and LatestVersionChanged)
//! ```

mod registry;

pub use registry::{PublishRequest, RegistryService, MAX_COMMIT_ATTEMPTS};

use std::sync::Arc;

use crate::config::RegistryConfig;
use crate::event_bus::EventBus;
use crate::registry::{StructuralValidator, Validator};
use crate::repository::ServerRepository;

/// Builder for [`RegistryService`] with shared dependencies
#[derive(Default)]
pub struct RegistryServiceBuilder {
    event_bus: Option<Arc<EventBus>>,
    repository: Option<Arc<dyn ServerRepository>>,
    validator: Option<Arc<dyn Validator>>,
    config: Option<RegistryConfig>,
}

impl RegistryServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn with_repository(mut self, repo: Arc<dyn ServerRepository>) -> Self {
        self.repository = Some(repo);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the service. A repository is required; everything else defaults.
    pub fn build(self) -> anyhow::Result<RegistryService> {
        let repository = self
            .repository
            .ok_or_else(|| anyhow::anyhow!("Server repository required"))?;

        Ok(RegistryService::new(
            repository,
            self.validator
                .unwrap_or_else(|| Arc::new(StructuralValidator::new())),
            self.config.unwrap_or_default(),
            self.event_bus.unwrap_or_else(|| Arc::new(EventBus::new())),
        ))
    }
}
