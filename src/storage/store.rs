//! Sensor reading store.
//!
//! Wraps one SQLite connection. Ingestion holds a single read-write store for
//! the lifetime of the process; `sensorctl` opens read-only stores.

use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::schema::{apply_pragmas, apply_reader_pragmas, initialize_schema};
use crate::reading::{SensorReading, StoredReading};

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

const INSERT_READING: &str = r#"
INSERT INTO sensor_data (timestamp, AcX, AcY, AcZ, GyX, GyY, GyZ, Temp, Hum, Btn)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

const SELECT_RECENT: &str = r#"
SELECT id, timestamp, AcX, AcY, AcZ, GyX, GyY, GyZ, Temp, Hum, Btn
FROM sensor_data
ORDER BY id DESC
LIMIT ?1
"#;

/// Store of sensor readings backed by SQLite.
#[derive(Debug)]
pub struct SensorStore {
    conn: Connection,
}

impl SensorStore {
    /// Open (or create) the database at `path` for writing.
    ///
    /// The schema is created if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        apply_pragmas(&conn)?;
        initialize_schema(&conn)?;

        tracing::debug!(path = %path.display(), "Store opened");
        Ok(Self { conn })
    }

    /// Open a fresh in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing database read-only.
    ///
    /// Fails if the file does not exist.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        apply_reader_pragmas(&conn)?;
        Ok(Self { conn })
    }

    /// Insert one reading and return its row id.
    ///
    /// The statement runs in autocommit mode, so the row is durable once
    /// this returns.
    pub fn insert(&self, reading: &SensorReading) -> Result<i64, StoreError> {
        let mut stmt = self.conn.prepare_cached(INSERT_READING)?;
        stmt.execute(params![
            reading.timestamp,
            reading.acceleration_x,
            reading.acceleration_y,
            reading.acceleration_z,
            reading.angular_velocity_x,
            reading.angular_velocity_y,
            reading.angular_velocity_z,
            reading.temperature,
            reading.humidity,
            reading.button_state,
        ])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The `limit` most recently inserted readings, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredReading>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(SELECT_RECENT)?;
        let rows = stmt
            .query_map([limit], stored_reading_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The most recently inserted reading, if any.
    pub fn latest(&self) -> Result<Option<StoredReading>, StoreError> {
        Ok(self.recent(1)?.into_iter().next())
    }

    /// Number of stored readings.
    pub fn count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM sensor_data", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn stored_reading_from_row(row: &Row<'_>) -> rusqlite::Result<StoredReading> {
    Ok(StoredReading {
        id: row.get(0)?,
        reading: SensorReading {
            timestamp: row.get(1)?,
            acceleration_x: row.get(2)?,
            acceleration_y: row.get(3)?,
            acceleration_z: row.get(4)?,
            angular_velocity_x: row.get(5)?,
            angular_velocity_y: row.get(6)?,
            angular_velocity_z: row.get(7)?,
            temperature: row.get(8)?,
            humidity: row.get(9)?,
            button_state: row.get(10)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reading_at(timestamp: i64) -> SensorReading {
        SensorReading {
            timestamp: Some(timestamp),
            ..SensorReading::default()
        }
    }

    #[test]
    fn test_insert_and_latest() {
        let store = SensorStore::open_in_memory().unwrap();
        let reading = SensorReading {
            timestamp: Some(1000),
            acceleration_x: Some(0.12),
            button_state: Some(1),
            ..SensorReading::default()
        };

        let id = store.insert(&reading).unwrap();
        let latest = store.latest().unwrap().unwrap();

        assert_eq!(latest.id, id);
        assert_eq!(latest.reading, reading);
    }

    #[test]
    fn test_ids_increase_and_timestamps_not_unique() {
        let store = SensorStore::open_in_memory().unwrap();
        let first = store.insert(&reading_at(50)).unwrap();
        let second = store.insert(&reading_at(50)).unwrap();
        let third = store.insert(&reading_at(10)).unwrap();

        assert!(first < second && second < third);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_recent_newest_first() {
        let store = SensorStore::open_in_memory().unwrap();
        for ts in 1..=5 {
            store.insert(&reading_at(ts)).unwrap();
        }

        let recent = store.recent(3).unwrap();
        let timestamps: Vec<_> = recent.iter().map(|r| r.reading.timestamp).collect();
        assert_eq!(timestamps, vec![Some(5), Some(4), Some(3)]);
    }

    #[test]
    fn test_empty_store() {
        let store = SensorStore::open_in_memory().unwrap();
        assert!(store.latest().unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_read_only_sees_writes() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sensors.db");

        let writer = SensorStore::open(&db_path).unwrap();
        writer.insert(&reading_at(7)).unwrap();

        let reader = SensorStore::open_read_only(&db_path).unwrap();
        assert_eq!(reader.count().unwrap(), 1);
        assert!(reader.insert(&reading_at(8)).is_err());
    }

    #[test]
    fn test_read_only_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = SensorStore::open_read_only(temp_dir.path().join("nope.db")).unwrap_err();
        assert!(matches!(err, StoreError::Open { .. }));
    }
}
