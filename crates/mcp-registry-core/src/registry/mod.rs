//! MCP Server Registry
//!
//! This module defines the schema of published server manifests, the
//! registry-owned metadata attached to them, and the validation port.

mod schema;
mod types;
mod validation;

pub use schema::*;
pub use types::*;
pub use validation::*;
