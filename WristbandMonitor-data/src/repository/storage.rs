use chrono::{DateTime, Utc};
use rusqlite::Row;
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::reading::{from_storage_timestamp, to_storage_timestamp, NewReadingRecord, ReadingRecord};
use super::errors::RepositoryError;

const SELECT_COLUMNS: &str = "id, device_id, hr, temp, spo2, bp_sys, bp_dia, created_at";

/// Database storage operations for wristband readings
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Store a reading in the database
    pub async fn insert(pool: &DatabasePool, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError> {
        debug!("Storing wristband reading in database: device_id={}", reading.device_id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                conn.execute(
                    "INSERT INTO wristband_data
                     (device_id, hr, temp, spo2, bp_sys, bp_dia, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    (
                        &reading.device_id,
                        reading.hr,
                        reading.temp,
                        reading.spo2,
                        reading.bp_sys,
                        reading.bp_dia,
                        to_storage_timestamp(&reading.created_at),
                    ),
                )?;

                let id = conn.last_insert_rowid();
                Ok(reading.into_record(id))
            },
        }
    }

    /// Readings with `start <= created_at < end`, ordered by `created_at` ascending
    pub async fn fetch_range(
        pool: &DatabasePool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReadingRecord>, RepositoryError> {
        debug!("Fetching wristband readings from {} to {}", start, end);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM wristband_data
                     WHERE created_at >= ?1 AND created_at < ?2
                     ORDER BY created_at ASC, id ASC"
                ))?;

                let rows = stmt.query_map(
                    [to_storage_timestamp(&start), to_storage_timestamp(&end)],
                    map_row,
                )?;

                collect_rows(rows)
            },
        }
    }

    /// Newest reading of every device, most recently active device first
    pub async fn latest_per_device(pool: &DatabasePool) -> Result<Vec<ReadingRecord>, RepositoryError> {
        debug!("Fetching latest wristband reading per device");

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM wristband_data AS w
                     WHERE w.id = (
                         SELECT latest.id FROM wristband_data AS latest
                         WHERE latest.device_id = w.device_id
                         ORDER BY latest.created_at DESC, latest.id DESC
                         LIMIT 1
                     )
                     ORDER BY w.created_at DESC, w.id DESC"
                ))?;

                let rows = stmt.query_map([], map_row)?;
                collect_rows(rows)
            },
        }
    }

    /// Round-trip a trivial query
    pub async fn ping(pool: &DatabasePool) -> Result<(), RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            },
        }
    }
}

/// Raw column values, the timestamp is parsed after the row is read
struct RawRow {
    id: i64,
    device_id: String,
    hr: i32,
    temp: f64,
    spo2: i32,
    bp_sys: i32,
    bp_dia: i32,
    created_at: String,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        device_id: row.get(1)?,
        hr: row.get(2)?,
        temp: row.get(3)?,
        spo2: row.get(4)?,
        bp_sys: row.get(5)?,
        bp_dia: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn collect_rows<I>(rows: I) -> Result<Vec<ReadingRecord>, RepositoryError>
where
    I: Iterator<Item = rusqlite::Result<RawRow>>,
{
    let mut result = Vec::new();
    for row in rows {
        let raw = row?;
        result.push(ReadingRecord {
            id: raw.id,
            device_id: raw.device_id,
            hr: raw.hr,
            temp: raw.temp,
            spo2: raw.spo2,
            bp_sys: raw.bp_sys,
            bp_dia: raw.bp_dia,
            created_at: from_storage_timestamp(&raw.created_at)?,
        });
    }
    Ok(result)
}
