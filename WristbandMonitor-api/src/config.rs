use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use wristband_monitor_data::database::{DatabaseConfig, DatabaseType};
use wristband_monitor_domain::entities::TimeWindow;
use wristband_monitor_domain::services::dashboard::DEFAULT_REFRESH_INTERVAL;

/// Server settings read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port (`PORT`, default 3000)
    pub port: u16,
    /// Directory holding the SQLite file unless `DB_SQLITE_PATH` is set
    pub data_dir: PathBuf,
    pub database: DatabaseConfig,
    /// Dashboard polling interval (`REFRESH_INTERVAL_SECS`, default 30)
    pub refresh_interval: Duration,
    /// Window used when a request names none (`DEFAULT_TIME_RANGE`, default 24h)
    pub default_window: TimeWindow,
    /// `APP_ENV`, reported by the health check
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(value) => value.parse::<u16>().with_context(|| format!("PORT must be a number, got '{}'", value))?,
            Err(_) => 3000,
        };

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

        let mut database = DatabaseConfig::from_env().context("Invalid database configuration")?;
        if database.db_type == DatabaseType::Sqlite && env::var("DB_SQLITE_PATH").is_err() {
            let path = data_dir.join("wristband.db");
            info!("DB_SQLITE_PATH not set, using {}", path.display());
            database.sqlite_path = Some(path.to_string_lossy().to_string());
        }

        let refresh_interval = match env::var("REFRESH_INTERVAL_SECS") {
            Ok(value) => {
                let secs = value
                    .parse::<u64>()
                    .with_context(|| format!("REFRESH_INTERVAL_SECS must be a number, got '{}'", value))?;
                anyhow::ensure!(secs > 0, "REFRESH_INTERVAL_SECS must be positive");
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_REFRESH_INTERVAL,
        };

        let default_window = match env::var("DEFAULT_TIME_RANGE") {
            Ok(value) => value.parse::<TimeWindow>().context("Invalid DEFAULT_TIME_RANGE")?,
            Err(_) => TimeWindow::default(),
        };

        Ok(Self {
            port,
            data_dir,
            database,
            refresh_interval,
            default_window,
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        })
    }
}
