//! Application service tests
//!
//! Tests for the registry service that orchestrates publishing with
//! quota checks, endpoint ownership, versioning and event emission.

mod listing;
mod publish;
mod remote_guard;
