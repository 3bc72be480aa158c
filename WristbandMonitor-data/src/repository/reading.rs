use chrono::{DateTime, Utc};
use tracing::debug;
use async_trait::async_trait;

use crate::models::reading::{NewReadingRecord, ReadingRecord};
use crate::database::DatabasePool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for wristband readings
#[async_trait]
pub trait ReadingRepositoryTrait: Send + Sync {
    /// Append one reading
    async fn insert(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError>;

    /// Readings with `start <= created_at < end`, ordered by `created_at` ascending
    async fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReadingRecord>, RepositoryError>;

    /// Newest reading of every device, most recently active device first
    async fn latest_per_device(&self) -> Result<Vec<ReadingRecord>, RepositoryError>;

    /// Check that the backing store answers
    async fn ping(&self) -> Result<(), RepositoryError>;
}

#[derive(Debug, Clone)]
enum Backend {
    Database(DatabasePool),
    Memory(InMemoryStorage),
}

/// Repository for wristband readings backed by SQLite or by process memory
#[derive(Debug, Clone)]
pub struct ReadingRepository {
    backend: Backend,
}

impl ReadingRepository {
    /// Repository over an initialized connection pool
    pub fn with_pool(pool: DatabasePool) -> Self {
        Self { backend: Backend::Database(pool) }
    }

    /// Repository over process memory
    pub fn in_memory() -> Self {
        Self { backend: Backend::Memory(InMemoryStorage::new()) }
    }

    /// Short description of the backing store
    pub fn describe(&self) -> String {
        match &self.backend {
            Backend::Database(pool) => crate::database::connection_info(pool),
            Backend::Memory(_) => "In-memory store".to_string(),
        }
    }
}

#[async_trait]
impl ReadingRepositoryTrait for ReadingRepository {
    async fn insert(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::insert(pool, reading).await,
            Backend::Memory(storage) => {
                debug!("Storing wristband reading in memory: device_id={}", reading.device_id);
                storage.insert(reading).await
            },
        }
    }

    async fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReadingRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::fetch_range(pool, start, end).await,
            Backend::Memory(storage) => storage.fetch_range(start, end).await,
        }
    }

    async fn latest_per_device(&self) -> Result<Vec<ReadingRecord>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::latest_per_device(pool).await,
            Backend::Memory(storage) => storage.latest_per_device().await,
        }
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::ping(pool).await,
            Backend::Memory(_) => Ok(()),
        }
    }
}

/// Mock wristband repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock implementation of the reading repository.
    ///
    /// Holds a fixed list of records; inserts are recorded but never returned
    /// by reads so tests control exactly what a fetch sees.
    #[derive(Debug, Default)]
    pub struct MockReadingRepository {
        readings: Vec<ReadingRecord>,
        inserted: Mutex<Vec<NewReadingRecord>>,
        failure: Option<String>,
    }

    impl MockReadingRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository with predefined readings
        pub fn with_readings(readings: Vec<ReadingRecord>) -> Self {
            Self { readings, ..Self::default() }
        }

        /// Make every call fail with `message`
        pub fn with_failure(mut self, message: &str) -> Self {
            self.failure = Some(message.to_string());
            self
        }

        /// Readings passed to `insert` so far
        pub fn inserted(&self) -> Vec<NewReadingRecord> {
            self.inserted.lock().map(|v| v.clone()).unwrap_or_default()
        }

        fn check(&self) -> Result<(), RepositoryError> {
            match &self.failure {
                Some(message) => Err(RepositoryError::Unavailable(message.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ReadingRepositoryTrait for MockReadingRepository {
        async fn insert(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError> {
            self.check()?;
            let mut inserted = self.inserted.lock()?;
            inserted.push(reading.clone());
            Ok(reading.into_record(inserted.len() as i64))
        }

        async fn fetch_range(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<ReadingRecord>, RepositoryError> {
            self.check()?;
            let mut readings: Vec<ReadingRecord> = self.readings.iter()
                .filter(|r| r.created_at >= start && r.created_at < end)
                .cloned()
                .collect();
            readings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(readings)
        }

        async fn latest_per_device(&self) -> Result<Vec<ReadingRecord>, RepositoryError> {
            self.check()?;
            let storage = InMemoryStorage::new();
            for record in &self.readings {
                storage.insert(NewReadingRecord {
                    device_id: record.device_id.clone(),
                    hr: record.hr,
                    temp: record.temp,
                    spo2: record.spo2,
                    bp_sys: record.bp_sys,
                    bp_dia: record.bp_dia,
                    created_at: record.created_at,
                }).await?;
            }
            storage.latest_per_device().await
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            self.check()
        }
    }
}
