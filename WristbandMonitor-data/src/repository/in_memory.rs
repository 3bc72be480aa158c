use std::sync::{Arc, Mutex};
use chrono::{DateTime, Utc};

use crate::models::reading::{NewReadingRecord, ReadingRecord};
use super::errors::RepositoryError;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    records: Vec<ReadingRecord>,
}

/// In-memory storage for wristband readings
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reading, assigning the next row id
    pub async fn insert(&self, reading: NewReadingRecord) -> Result<ReadingRecord, RepositoryError> {
        let mut store = self.inner.lock()?;
        store.next_id += 1;
        let record = reading.into_record(store.next_id);
        store.records.push(record.clone());
        Ok(record)
    }

    /// Readings with `start <= created_at < end`, oldest first
    pub async fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReadingRecord>, RepositoryError> {
        let store = self.inner.lock()?;
        let mut readings: Vec<ReadingRecord> = store.records.iter()
            .filter(|r| r.created_at >= start && r.created_at < end)
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps
        readings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(readings)
    }

    /// Newest reading of every device, most recently active device first
    pub async fn latest_per_device(&self) -> Result<Vec<ReadingRecord>, RepositoryError> {
        let store = self.inner.lock()?;
        let mut latest: Vec<ReadingRecord> = Vec::new();

        for record in &store.records {
            match latest.iter_mut().find(|r| r.device_id == record.device_id) {
                Some(existing) => {
                    if (record.created_at, record.id) >= (existing.created_at, existing.id) {
                        *existing = record.clone();
                    }
                },
                None => latest.push(record.clone()),
            }
        }

        latest.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(latest)
    }
}
