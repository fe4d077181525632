//! Subscriber loop.
//!
//! Waits for the broker to acknowledge the first connection, subscribes, and
//! then hands every delivered message to the [`IngestHandler`] in delivery
//! order. Messages are handled one at a time on the calling task.
//!
//! Failure policy:
//! - No acknowledgment, a refusal, or a transport error before the first
//!   acknowledgment ends the loop with an error.
//! - After that, dropped connections are retried after `reconnect_delay` and
//!   the topic is subscribed again on every new acknowledgment.
//! - A message that fails to ingest is logged and dropped.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

use super::handler::IngestHandler;
use super::transport::{Transport, TransportError, TransportEvent};
use crate::config::Config;

/// Error type for the subscriber loop.
#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("broker refused connection (return code {code})")]
    ConnectRefused { code: u8 },

    #[error("no connection acknowledgment within {0:?}")]
    ConnectTimeout(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Subscription settings.
#[derive(Debug, Clone)]
pub struct SubscriberOptions {
    pub topic: String,
    pub qos: u8,
    pub connect_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl SubscriberOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            topic: config.topic.clone(),
            qos: config.qos,
            connect_timeout: config.connect_timeout(),
            reconnect_delay: config.reconnect_delay(),
        }
    }
}

/// Counters for messages seen by the loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Messages stored as rows.
    pub stored: u64,
    /// Messages rejected at any stage.
    pub dropped: u64,
}

/// Drives a [`Transport`] and feeds its messages to an [`IngestHandler`].
pub struct Subscriber<T> {
    transport: T,
    handler: IngestHandler,
    options: SubscriberOptions,
    stats: IngestStats,
}

impl<T: Transport> Subscriber<T> {
    pub fn new(transport: T, handler: IngestHandler, options: SubscriberOptions) -> Self {
        Self {
            transport,
            handler,
            options,
            stats: IngestStats::default(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn handler(&self) -> &IngestHandler {
        &self.handler
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Run until `shutdown` changes.
    ///
    /// Returns the message counters on a clean shutdown.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<IngestStats, SubscriberError> {
        let connect_timeout = self.options.connect_timeout;

        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                tracing::info!("Shutdown requested before broker connection");
                return Ok(self.stats);
            }
            connected = tokio::time::timeout(connect_timeout, self.await_first_connack()) => {
                match connected {
                    Ok(result) => result?,
                    Err(_) => return Err(SubscriberError::ConnectTimeout(connect_timeout)),
                }
            }
        }

        tracing::info!("Connected to broker");
        let subscribed = tokio::select! {
            biased;
            _ = shutdown.changed() => false,
            result = self.subscribe() => {
                result?;
                true
            }
        };

        if subscribed {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    event = self.transport.poll() => event,
                };
                if !self.handle_event(event, &mut shutdown).await {
                    break;
                }
            }
        }

        tracing::info!(
            stored = self.stats.stored,
            dropped = self.stats.dropped,
            "Subscriber stopping"
        );
        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!(error = %e, "Clean disconnect failed");
        }
        Ok(self.stats)
    }

    async fn await_first_connack(&mut self) -> Result<(), SubscriberError> {
        loop {
            match self.transport.poll().await? {
                TransportEvent::Connected => return Ok(()),
                TransportEvent::Refused { code } => {
                    tracing::error!(code, "Broker refused connection");
                    return Err(SubscriberError::ConnectRefused { code });
                }
                TransportEvent::Message { topic, payload } => {
                    self.handle_message(&topic, &payload);
                }
                TransportEvent::Idle => {}
            }
        }
    }

    async fn subscribe(&mut self) -> Result<(), TransportError> {
        self.transport
            .subscribe(&self.options.topic, self.options.qos)
            .await?;
        tracing::info!(topic = %self.options.topic, qos = self.options.qos, "Subscribed");
        Ok(())
    }

    /// Act on one transport event.
    ///
    /// Returns false when shutdown was requested while waiting on the
    /// transport or a retry delay.
    async fn handle_event(
        &mut self,
        event: Result<TransportEvent, TransportError>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        match event {
            Ok(TransportEvent::Message { topic, payload }) => {
                self.handle_message(&topic, &payload);
                true
            }
            Ok(TransportEvent::Connected) => {
                tracing::info!("Reconnected to broker");
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => false,
                    result = self.subscribe() => {
                        if let Err(e) = result {
                            tracing::error!(error = %e, "Resubscribe failed");
                        }
                        true
                    }
                }
            }
            Ok(TransportEvent::Refused { code }) => {
                tracing::error!(code, "Broker refused reconnection");
                self.wait_before_retry(shutdown).await
            }
            Ok(TransportEvent::Idle) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    retry_in = ?self.options.reconnect_delay,
                    "Broker connection lost"
                );
                self.wait_before_retry(shutdown).await
            }
        }
    }

    async fn wait_before_retry(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            biased;
            _ = shutdown.changed() => false,
            _ = tokio::time::sleep(self.options.reconnect_delay) => true,
        }
    }

    fn handle_message(&mut self, topic: &str, payload: &[u8]) {
        tracing::debug!(
            topic,
            bytes = payload.len(),
            payload = %String::from_utf8_lossy(payload),
            "Message received"
        );

        match self.handler.on_message(topic, payload) {
            Ok(_) => self.stats.stored += 1,
            Err(e) => {
                self.stats.dropped += 1;
                tracing::warn!(topic, stage = %e.stage(), error = %e, "Dropping message");
            }
        }
    }
}
