//! Count command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use sensor_sink::storage::SensorStore;
use std::path::Path;

use crate::OutputFormat;

#[derive(Serialize)]
struct CountOutput {
    readings: i64,
}

pub fn run(store_path: &Path, format: OutputFormat) -> Result<()> {
    let store = SensorStore::open_read_only(store_path).context("failed to open store")?;
    let readings = store.count().context("count query failed")?;

    match format {
        OutputFormat::Text => println!("{readings} reading(s)"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&CountOutput { readings })?);
        }
    }

    Ok(())
}
