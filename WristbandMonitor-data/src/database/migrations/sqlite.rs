use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_wristband_data_table(conn)?;
    create_created_at_index(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the wristband readings table
fn create_wristband_data_table(conn: &Connection) -> Result<(), String> {
    info!("Creating wristband_data table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS wristband_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id TEXT NOT NULL,
            hr INTEGER NOT NULL,
            temp REAL NOT NULL DEFAULT 0,
            spo2 INTEGER NOT NULL,
            bp_sys INTEGER NOT NULL,
            bp_dia INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create index on created_at for windowed reads
fn create_created_at_index(conn: &Connection) -> Result<(), String> {
    info!("Creating index on created_at");

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_wristband_data_created_at
        ON wristband_data (created_at)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'wristband_data'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
