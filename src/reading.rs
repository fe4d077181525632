//! Sensor reading data model.
//!
//! A [`SensorReading`] is one telemetry sample as published by the sensor
//! firmware. Every field is optional: keys missing from the payload, or set to
//! `null`, are stored as SQL NULL.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Payload keys that map to stored columns, in insert order.
pub const RECOGNIZED_KEYS: [&str; 10] = [
    "timestamp", "AcX", "AcY", "AcZ", "GyX", "GyY", "GyZ", "Temp", "Hum", "Btn",
];

/// Error type for turning a decoded document into a reading.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("invalid field value: {0}")]
    InvalidField(#[source] serde_json::Error),
}

/// One telemetry sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Producer-supplied epoch value, not assigned here.
    pub timestamp: Option<i64>,
    #[serde(rename = "AcX")]
    pub acceleration_x: Option<f64>,
    #[serde(rename = "AcY")]
    pub acceleration_y: Option<f64>,
    #[serde(rename = "AcZ")]
    pub acceleration_z: Option<f64>,
    #[serde(rename = "GyX")]
    pub angular_velocity_x: Option<f64>,
    #[serde(rename = "GyY")]
    pub angular_velocity_y: Option<f64>,
    #[serde(rename = "GyZ")]
    pub angular_velocity_z: Option<f64>,
    #[serde(rename = "Temp")]
    pub temperature: Option<f64>,
    #[serde(rename = "Hum")]
    pub humidity: Option<f64>,
    /// Usually 0 or 1.
    #[serde(rename = "Btn")]
    pub button_state: Option<i64>,
}

impl SensorReading {
    /// Extract a reading from a decoded JSON document.
    ///
    /// Unrecognized keys are ignored. A recognized key holding a value of the
    /// wrong type rejects the whole document.
    pub fn from_document(document: Value) -> Result<Self, ExtractError> {
        let kind = match &document {
            Value::Object(_) => None,
            Value::Null => Some("null"),
            Value::Bool(_) => Some("a boolean"),
            Value::Number(_) => Some("a number"),
            Value::String(_) => Some("a string"),
            Value::Array(_) => Some("an array"),
        };
        if let Some(kind) = kind {
            return Err(ExtractError::NotAnObject(kind));
        }

        serde_json::from_value(document).map_err(ExtractError::InvalidField)
    }

    /// True when none of the tracked fields carry a value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A reading as stored, with its row identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredReading {
    pub id: i64,
    #[serde(flatten)]
    pub reading: SensorReading,
}
