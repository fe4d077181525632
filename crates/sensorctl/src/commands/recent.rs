//! Recent command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use sensor_sink::storage::SensorStore;
use sensor_sink::StoredReading;
use std::path::Path;

use crate::OutputFormat;

#[derive(Serialize)]
struct RecentOutput {
    readings: Vec<StoredReading>,
    total: usize,
}

pub fn run(store_path: &Path, limit: usize, format: OutputFormat) -> Result<()> {
    let store = SensorStore::open_read_only(store_path).context("failed to open store")?;
    let readings = store.recent(limit).context("query failed")?;

    let output = RecentOutput {
        total: readings.len(),
        readings,
    };

    match format {
        OutputFormat::Text => {
            if output.readings.is_empty() {
                println!("No data found.");
            } else {
                println!(
                    "{:>6} {:>12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7} {:>7} {:>4}",
                    "ID", "TIMESTAMP", "AcX", "AcY", "AcZ", "GyX", "GyY", "GyZ", "Temp", "Hum",
                    "Btn"
                );
                println!("{}", "-".repeat(102));
                for row in &output.readings {
                    let r = &row.reading;
                    println!(
                        "{:>6} {:>12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7} {:>7} {:>4}",
                        row.id,
                        cell(r.timestamp),
                        cell(r.acceleration_x),
                        cell(r.acceleration_y),
                        cell(r.acceleration_z),
                        cell(r.angular_velocity_x),
                        cell(r.angular_velocity_y),
                        cell(r.angular_velocity_z),
                        cell(r.temperature),
                        cell(r.humidity),
                        cell(r.button_state),
                    );
                }
                println!();
                println!("Total: {} reading(s)", output.total);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
