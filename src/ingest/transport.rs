//! Broker transport.
//!
//! The subscriber only needs a narrow view of the broker connection: a stream
//! of connection and message events plus subscribe/disconnect requests.
//! [`MqttTransport`] provides it over `rumqttc`; tests script their own.

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS,
};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("transport closed")]
    Closed,

    #[error("DISCONNECT not written within {0:?}")]
    DisconnectTimeout(Duration),
}

/// Upper bound on flushing DISCONNECT during shutdown.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Event surfaced by a transport poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted the connection (return code 0).
    Connected,
    /// The broker answered the connect with a nonzero return code.
    Refused { code: u8 },
    /// A message arrived on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
    /// Protocol traffic the subscriber does not act on.
    Idle,
}

/// Connection to a publish/subscribe broker.
///
/// `poll` is called in a loop by a single task; implementations need not be
/// `Sync`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Wait for the next event.
    async fn poll(&mut self) -> Result<TransportEvent, TransportError>;

    /// Request a subscription to `topic`.
    async fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), TransportError>;

    /// Disconnect cleanly, returning once the request has reached the
    /// broker or failed.
    async fn disconnect(&mut self) -> Result<(), TransportError>;
}

/// MQTT transport backed by `rumqttc`.
pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl MqttTransport {
    /// Build a transport from configuration.
    ///
    /// No network I/O happens until the first [`Transport::poll`].
    pub fn new(config: &Config) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, config.event_capacity);
        Self { client, eventloop }
    }
}

fn qos_level(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

impl Transport for MqttTransport {
    async fn poll(&mut self) -> Result<TransportEvent, TransportError> {
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    Ok(TransportEvent::Connected)
                } else {
                    Ok(TransportEvent::Refused {
                        code: ack.code as u8,
                    })
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => Ok(TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Ok(event) => {
                tracing::trace!(?event, "mqtt event");
                Ok(TransportEvent::Idle)
            }
            Err(ConnectionError::ConnectionRefused(code)) => {
                Ok(TransportEvent::Refused { code: code as u8 })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), TransportError> {
        self.client.subscribe(topic, qos_level(qos)).await?;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let client = self.client.clone();
        let eventloop = &mut self.eventloop;

        // The request only reaches the socket while the event loop is polled,
        // and queueing it can wait on a full request channel.
        let flush = async {
            let request = client.disconnect();
            tokio::pin!(request);
            let mut queued = false;
            loop {
                tokio::select! {
                    result = &mut request, if !queued => {
                        if let Err(e) = result {
                            return Err(TransportError::from(e));
                        }
                        queued = true;
                    }
                    event = eventloop.poll() => match event {
                        Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                        Ok(event) => tracing::trace!(?event, "mqtt event during disconnect"),
                        Err(e) => return Err(TransportError::from(e)),
                    },
                }
            }
        };

        match tokio::time::timeout(DISCONNECT_TIMEOUT, flush).await {
            Ok(result) => {
                result?;
                tracing::debug!("DISCONNECT sent");
                Ok(())
            }
            Err(_) => Err(TransportError::DisconnectTimeout(DISCONNECT_TIMEOUT)),
        }
    }
}
