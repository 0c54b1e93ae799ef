//! GraphQL API with subscriptions for real-time updates
//!
//! This module provides a GraphQL API using async-graphql with support for
//! queries, mutations, and subscriptions over WebSocket.
//!
//! This is the single API surface for the catalog backend.

pub mod auth;
pub mod events;
mod schema;
mod subscriptions;
pub mod types;
pub mod validate;

pub use auth::{CurrentUser, extract_bearer, verify_token};
pub use events::{CatalogEvent, EventBus};
pub use schema::{CatalogSchema, build_schema};
