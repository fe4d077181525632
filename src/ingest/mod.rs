//! Message ingestion.
//!
//! - [`handler`]: decode, extract and persist one payload
//! - [`transport`]: the broker connection seen as a stream of events
//! - [`subscriber`]: the loop tying the two together

pub mod handler;
pub mod subscriber;
pub mod transport;

pub use handler::IngestHandler;
pub use subscriber::{IngestStats, Subscriber, SubscriberError, SubscriberOptions};
pub use transport::{MqttTransport, Transport, TransportError, TransportEvent};

use std::fmt;
use thiserror::Error;

use crate::reading::ExtractError;
use crate::storage::StoreError;

/// Error type for payload decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline stage at which a message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Extract,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => f.write_str("decode"),
            Self::Extract => f.write_str("extract"),
            Self::Persist => f.write_str("persist"),
        }
    }
}

/// Error type for a single message passing through the handler.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("extract failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("persist failed: {0}")]
    Persist(#[from] StoreError),
}

impl IngestError {
    /// The stage that rejected the message.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Decode(_) => Stage::Decode,
            Self::Extract(_) => Stage::Extract,
            Self::Persist(_) => Stage::Persist,
        }
    }
}
