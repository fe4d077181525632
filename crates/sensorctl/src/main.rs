//! sensorctl: Command-line interface for a Sensor Sink store.
//!
//! Reads the SQLite file written by `sensor-sink`: recent readings, row
//! counts, and schema setup ahead of first start.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for a Sensor Sink store.
#[derive(Parser)]
#[command(name = "sensorctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(short, long, env = "SENSOR_SINK_STORE_PATH", default_value = "sensor_data.db")]
    store_path: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the sensor table if it does not exist
    Init,
    /// Show the most recently stored readings, newest first
    Recent {
        /// Maximum number of readings to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show the number of stored readings
    Count,
}

fn main() -> Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init::run(&cli.store_path, cli.output)?,
        Commands::Recent { limit } => commands::recent::run(&cli.store_path, limit, cli.output)?,
        Commands::Count => commands::count::run(&cli.store_path, cli.output)?,
    }

    Ok(())
}
