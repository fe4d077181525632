//! Init command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use sensor_sink::storage::ensure_schema;
use std::path::Path;

use crate::OutputFormat;

#[derive(Serialize)]
struct InitOutput {
    store_path: String,
    initialized: bool,
}

pub fn run(store_path: &Path, format: OutputFormat) -> Result<()> {
    ensure_schema(store_path)
        .with_context(|| format!("failed to initialize {}", store_path.display()))?;

    match format {
        OutputFormat::Text => {
            println!("Schema ready at {}", store_path.display());
        }
        OutputFormat::Json => {
            let output = InitOutput {
                store_path: store_path.display().to_string(),
                initialized: true,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
