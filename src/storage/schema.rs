//! Schema definition and connection setup.

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use super::store::StoreError;

const CREATE_SENSOR_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sensor_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER,
    AcX REAL,
    AcY REAL,
    AcZ REAL,
    GyX REAL,
    GyY REAL,
    GyZ REAL,
    Temp REAL,
    Hum REAL,
    Btn INTEGER
);
"#;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Apply pragmas for the write connection.
///
/// WAL lets `sensorctl` read while ingestion is running.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::trace!(journal_mode = %mode, "Journal mode set");
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)
}

/// Apply pragmas for read-only connections.
pub fn apply_reader_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)
}

/// Create the sensor table if it does not exist yet.
///
/// Leaves existing tables and rows untouched.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_SENSOR_TABLE)
}

/// Open the database at `path`, create the schema if needed and close it.
///
/// Must succeed before any message is ingested; callers treat an error as
/// fatal.
pub fn ensure_schema<P: AsRef<Path>>(path: P) -> Result<(), StoreError> {
    let path = path.as_ref();
    let conn = Connection::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    initialize_schema(&conn)?;
    conn.close().map_err(|(_, e)| StoreError::Database(e))?;

    tracing::debug!(path = %path.display(), "Schema ensured");
    Ok(())
}
