//! Domain entities, value objects, and events
//!
//! - Entities (ServerRecord)
//! - Value Objects (ServerFilter, Publisher)
//! - Domain Events (DomainEvent enum emitted after commits)

mod event;
mod filter;
mod record;

pub use event::DomainEvent;
pub use filter::ServerFilter;
pub use record::{Publisher, PublisherExtensions, ServerRecord};
