//! Test utilities for Sensor Sink tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - A scripted transport standing in for the MQTT broker

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sensor_sink::ingest::{SubscriberOptions, Transport, TransportError, TransportEvent};
use tempfile::TempDir;
use tokio::sync::watch;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("sensor_data.db");
        Self { temp_dir, db_path }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Make inserts with a negative `timestamp` fail inside SQLite.
///
/// The schema must already exist at `db_path`.
pub fn reject_negative_timestamps(db_path: &Path) {
    let conn = rusqlite::Connection::open(db_path).expect("open failed");
    conn.execute_batch(
        r#"
        CREATE TRIGGER reject_negative_timestamp
        BEFORE INSERT ON sensor_data
        WHEN NEW.timestamp < 0
        BEGIN
            SELECT RAISE(ABORT, 'negative timestamp');
        END;
        "#,
    )
    .expect("create trigger failed");
}

/// Subscriber options with short timeouts.
pub fn test_options() -> SubscriberOptions {
    SubscriberOptions {
        topic: "esp32/sensors".into(),
        qos: 0,
        connect_timeout: Duration::from_millis(200),
        reconnect_delay: Duration::from_millis(1),
    }
}

pub fn message(payload: &[u8]) -> Result<TransportEvent, TransportError> {
    Ok(TransportEvent::Message {
        topic: "esp32/sensors".into(),
        payload: payload.to_vec(),
    })
}

/// Transport that replays a fixed list of events.
///
/// Once the script is exhausted it requests shutdown (when built with
/// [`ScriptedTransport::with_shutdown`]) and then never yields again.
pub struct ScriptedTransport {
    events: VecDeque<Result<TransportEvent, TransportError>>,
    shutdown: Option<watch::Sender<bool>>,
    stall_subscribe: bool,
    pub subscriptions: Vec<(String, u8)>,
    pub disconnected: bool,
}

impl ScriptedTransport {
    pub fn new(events: Vec<Result<TransportEvent, TransportError>>) -> Self {
        Self {
            events: events.into(),
            shutdown: None,
            stall_subscribe: false,
            subscriptions: Vec::new(),
            disconnected: false,
        }
    }

    /// Build a transport that triggers shutdown once drained.
    ///
    /// Returns the receiver to pass to `Subscriber::run`.
    pub fn with_shutdown(
        events: Vec<Result<TransportEvent, TransportError>>,
    ) -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        let mut transport = Self::new(events);
        transport.shutdown = Some(tx);
        (transport, rx)
    }

    /// Make every subscribe request wait forever, like a client whose
    /// request channel is never drained.
    pub fn stalling_subscribe(mut self) -> Self {
        self.stall_subscribe = true;
        self
    }
}

impl Transport for ScriptedTransport {
    async fn poll(&mut self) -> Result<TransportEvent, TransportError> {
        if let Some(event) = self.events.pop_front() {
            return event;
        }
        if let Some(shutdown) = &self.shutdown {
            let _ = shutdown.send(true);
        }
        std::future::pending().await
    }

    async fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), TransportError> {
        if self.stall_subscribe {
            std::future::pending::<()>().await;
        }
        self.subscriptions.push((topic.to_string(), qos));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.disconnected = true;
        Ok(())
    }
}
