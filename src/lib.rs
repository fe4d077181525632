//! Sensor Sink: MQTT sensor telemetry ingestion into SQLite.
//!
//! Every JSON message delivered on the configured topic becomes one row in
//! the `sensor_data` table. Messages are handled one at a time, in delivery
//! order, over a single long-lived SQLite connection.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`ingest`]: Message handler, transport abstraction and subscriber loop
//! - [`observability`]: Tracing setup
//! - [`reading`]: The `SensorReading` data model and payload extraction
//! - [`storage`]: SQLite schema and store

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // ingest::IngestError is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod config;
pub mod ingest;
pub mod observability;
pub mod reading;
pub mod storage;

pub use reading::{SensorReading, StoredReading};
