//! Ingestion handler.
//!
//! Turns one raw payload into one stored row. Any failure rejects the whole
//! message; nothing is written for it.

use serde_json::Value;

use super::{DecodeError, IngestError};
use crate::reading::SensorReading;
use crate::storage::SensorStore;

/// Decode a raw payload into a JSON document.
pub fn decode(payload: &[u8]) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(payload)?;
    Ok(serde_json::from_str(text)?)
}

/// Handler invoked once per delivered message.
#[derive(Debug)]
pub struct IngestHandler {
    store: SensorStore,
}

impl IngestHandler {
    pub fn new(store: SensorStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SensorStore {
        &self.store
    }

    /// Decode, extract and persist one message.
    ///
    /// Returns the id of the inserted row.
    #[tracing::instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub fn on_message(&self, topic: &str, payload: &[u8]) -> Result<i64, IngestError> {
        let document = decode(payload)?;
        let reading = SensorReading::from_document(document)?;
        if reading.is_empty() {
            tracing::debug!("Payload carried no recognized keys, storing an all-null row");
        }
        let id = self.store.insert(&reading)?;

        tracing::debug!(id, timestamp = ?reading.timestamp, "Reading stored");
        Ok(id)
    }
}
