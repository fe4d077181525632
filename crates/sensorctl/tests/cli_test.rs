//! sensorctl command tests against a temporary store.

use sensor_sink::storage::SensorStore;
use sensor_sink::SensorReading;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_sensorctl");

fn sensorctl(store_path: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .arg("--store-path")
        .arg(store_path)
        .args(args)
        .output()
        .expect("failed to run sensorctl")
}

#[test]
fn test_init_then_count() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sensor_data.db");

    let output = sensorctl(&db_path, &["init"]);
    assert!(output.status.success());
    assert!(db_path.exists());

    // Repeating init is harmless
    assert!(sensorctl(&db_path, &["init"]).status.success());

    let output = sensorctl(&db_path, &["count"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0 reading(s)");
}

#[test]
fn test_recent_json() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sensor_data.db");
    {
        let store = SensorStore::open(&db_path).unwrap();
        for ts in [100, 200, 300] {
            store
                .insert(&SensorReading {
                    timestamp: Some(ts),
                    temperature: Some(21.0),
                    ..SensorReading::default()
                })
                .unwrap();
        }
    }

    let output = sensorctl(&db_path, &["--output", "json", "recent", "--limit", "2"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total"], 2);
    assert_eq!(value["readings"][0]["timestamp"], 300);
    assert_eq!(value["readings"][1]["timestamp"], 200);
    assert_eq!(value["readings"][0]["Temp"], 21.0);
    assert!(value["readings"][0]["Hum"].is_null());
}

#[test]
fn test_recent_text_empty() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sensor_data.db");
    assert!(sensorctl(&db_path, &["init"]).status.success());

    let output = sensorctl(&db_path, &["recent"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No data found."));
}

#[test]
fn test_missing_store_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = sensorctl(&temp_dir.path().join("absent.db"), &["count"]);
    assert!(!output.status.success());
}
