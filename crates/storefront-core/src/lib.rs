//! Cross-service plumbing: config loading, tracing, health, middleware, serde helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
