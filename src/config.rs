//! Configuration parsing for Sensor Sink.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Defaults matching the stock ESP32 sensor firmware setup

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Sensor Sink: stores MQTT sensor telemetry in SQLite.
#[derive(Parser, Debug, Clone)]
#[command(name = "sensor-sink")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// MQTT broker host
    #[arg(long, env = "SENSOR_SINK_BROKER_HOST", default_value = "localhost")]
    pub broker_host: String,

    /// MQTT broker port
    #[arg(short = 'p', long, env = "SENSOR_SINK_BROKER_PORT", default_value_t = 1883)]
    pub broker_port: u16,

    /// Topic the sensors publish readings on
    #[arg(short, long, env = "SENSOR_SINK_TOPIC", default_value = "esp32/sensors")]
    pub topic: String,

    /// MQTT client identifier
    #[arg(long, env = "SENSOR_SINK_CLIENT_ID", default_value = "mqtt_sqlite_client")]
    pub client_id: String,

    /// Path to the SQLite database file
    #[arg(short, long, env = "SENSOR_SINK_STORE_PATH", default_value = "sensor_data.db")]
    pub store_path: PathBuf,

    /// Subscription QoS level (0, 1 or 2)
    #[arg(long, env = "SENSOR_SINK_QOS", default_value_t = 0,
          value_parser = clap::value_parser!(u8).range(0..=2))]
    pub qos: u8,

    /// MQTT keep-alive interval in seconds
    #[arg(long, env = "SENSOR_SINK_KEEP_ALIVE_SECS", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(5..))]
    pub keep_alive_secs: u64,

    /// Seconds to wait for the broker to acknowledge the first connection
    #[arg(long, env = "SENSOR_SINK_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    pub connect_timeout_secs: u64,

    /// Delay before polling again after a dropped connection
    #[arg(long, env = "SENSOR_SINK_RECONNECT_DELAY_MS", default_value_t = 2000)]
    pub reconnect_delay_ms: u64,

    /// Capacity of the MQTT client request channel
    #[arg(long, env = "SENSOR_SINK_EVENT_CAPACITY", default_value_t = 32,
          value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub event_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "SENSOR_SINK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Create a configuration for testing with short timeouts.
    #[cfg(test)]
    pub fn test_config(store_path: PathBuf) -> Self {
        Self {
            broker_host: "127.0.0.1".into(),
            client_id: "sensor-sink-test".into(),
            store_path,
            connect_timeout_secs: 1,
            reconnect_delay_ms: 10,
            log_level: "debug".into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_host: "localhost".into(),
            broker_port: 1883,
            topic: "esp32/sensors".into(),
            client_id: "mqtt_sqlite_client".into(),
            store_path: PathBuf::from("sensor_data.db"),
            qos: 0,
            keep_alive_secs: 30,
            connect_timeout_secs: 30,
            reconnect_delay_ms: 2000,
            event_capacity: 32,
            log_level: "info".into(),
            log_format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.topic, "esp32/sensors");
        assert_eq!(config.client_id, "mqtt_sqlite_client");
        assert_eq!(config.store_path, PathBuf::from("sensor_data.db"));
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::try_parse_from([
            "sensor-sink",
            "--broker-host",
            "192.168.0.127",
            "--topic",
            "lab/sensors",
            "--store-path",
            "/tmp/lab.db",
            "--qos",
            "1",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.broker_host, "192.168.0.127");
        assert_eq!(config.topic, "lab/sensors");
        assert_eq!(config.store_path, PathBuf::from("/tmp/lab.db"));
        assert_eq!(config.qos, 1);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_invalid_qos() {
        let result = Config::try_parse_from(["sensor-sink", "--qos", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_event_capacity() {
        let result = Config::try_parse_from(["sensor-sink", "--event-capacity", "0"]);
        assert!(result.is_err());

        let config = Config::try_parse_from(["sensor-sink", "--event-capacity", "1"]).unwrap();
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn test_durations() {
        let config = Config::test_config(PathBuf::from("test.db"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.reconnect_delay(), Duration::from_millis(10));
        assert_eq!(config.keep_alive(), Duration::from_secs(30));
    }
}
