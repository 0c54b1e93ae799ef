//! API route definitions
//!
//! The primary API is GraphQL at /graphql. REST endpoints exist only for
//! operations that don't work well with GraphQL: serving stored image bytes
//! and health probes.

pub mod health;
pub mod images;
