//! Sensor Sink: stores MQTT sensor telemetry in SQLite.
//!
//! # Usage
//!
//! ```bash
//! sensor-sink --broker-host 192.168.0.127 --topic esp32/sensors --store-path sensor_data.db
//! ```
//!
//! Environment variables can also be used:
//! - `SENSOR_SINK_BROKER_HOST`, `SENSOR_SINK_BROKER_PORT`: Broker address
//! - `SENSOR_SINK_TOPIC`: Topic to subscribe to
//! - `SENSOR_SINK_STORE_PATH`: SQLite database file
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use sensor_sink::config::Config;
use sensor_sink::ingest::{IngestHandler, MqttTransport, Subscriber, SubscriberOptions};
use sensor_sink::observability::tracing::init_tracing;
use sensor_sink::storage::{ensure_schema, SensorStore};
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Sensor Sink v{} - MQTT telemetry to SQLite

  Configuration:
    Broker:     {}:{}
    Client ID:  {}
    Topic:      {} (QoS {})
    Store:      {}
    Log Level:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.broker_host,
        config.broker_port,
        config.client_id,
        config.topic,
        config.qos,
        config.store_path.display(),
        config.log_level
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Initialize tracing/logging
    init_tracing("sensor-sink", &config.log_level, config.log_format);

    print_banner(&config);

    // Nothing is subscribed without a usable schema
    ensure_schema(&config.store_path).map_err(|e| {
        tracing::error!(error = %e, "Store initialization failed");
        e
    })?;
    let store = SensorStore::open(&config.store_path)?;
    let handler = IngestHandler::new(store);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        // Wait for SIGTERM or SIGINT (Ctrl+C)
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("failed to listen for ctrl+c");
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        let _ = shutdown_tx.send(true);
    });

    tracing::info!(
        broker = %format!("{}:{}", config.broker_host, config.broker_port),
        client_id = %config.client_id,
        "Connecting to broker"
    );

    let transport = MqttTransport::new(&config);
    let mut subscriber =
        Subscriber::new(transport, handler, SubscriberOptions::from_config(&config));

    let stats = subscriber.run(shutdown_rx).await.map_err(|e| {
        tracing::error!(error = %e, "Subscriber failed");
        e
    })?;

    tracing::info!(
        stored = stats.stored,
        dropped = stats.dropped,
        "Sensor Sink shutdown complete"
    );
    Ok(())
}
