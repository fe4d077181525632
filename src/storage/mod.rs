//! SQLite storage layer for Sensor Sink.
//!
//! Provides:
//! - Idempotent schema initialization
//! - A single long-lived write connection for ingestion
//! - Read-only access for queries

pub mod schema;
pub mod store;

pub use schema::ensure_schema;
pub use store::{SensorStore, StoreError};
