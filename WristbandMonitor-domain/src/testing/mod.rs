// Testing utilities and mock implementations for the domain layer
// This module is only available when the "mock" feature is enabled

// Re-export useful test mocks from the data layer
pub use wristband_monitor_data::repository::tests::MockReadingRepository;

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::entities::analytics::TimeWindow;
use crate::entities::reading::{IngestRequest, Reading};
use crate::entities::vitals::DeviceCard;
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::analytics::{AnalyticsServiceError, AnalyticsServiceTrait};
use crate::services::ingestion::{IngestionServiceError, IngestionServiceTrait};
use crate::services::vitals::{device_card, estimate_blood_pressure};

/// Build a reading with blood pressure derived the same way ingestion does
pub fn sample_reading(device_id: &str, hr: i32, temp: f64, spo2: i32, created_at: DateTime<Utc>) -> Reading {
    let bp = estimate_blood_pressure(hr, spo2);
    Reading {
        device_id: device_id.to_string(),
        hr,
        temp,
        spo2,
        bp_sys: bp.systolic,
        bp_dia: bp.diastolic,
        created_at,
    }
}

/// Three W1 readings with hr 65, 70 and 75 spread over the last half hour
pub fn sample_batch(now: DateTime<Utc>) -> Vec<Reading> {
    vec![
        sample_reading("W1", 65, 36.5, 98, now - Duration::minutes(30)),
        sample_reading("W1", 70, 36.6, 98, now - Duration::minutes(20)),
        sample_reading("W1", 75, 36.7, 98, now - Duration::minutes(10)),
    ]
}

/// Mock implementation of the IngestionServiceTrait for testing
#[derive(Default)]
pub struct MockIngestionService {
    stored: RwLock<Vec<Reading>>,
    should_fail_persistence: bool,
}

impl MockIngestionService {
    /// Create a new mock ingestion service
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail every write
    pub fn with_persistence_failure(mut self) -> Self {
        self.should_fail_persistence = true;
        self
    }

    /// Readings accepted so far
    pub fn stored(&self) -> Vec<Reading> {
        self.stored.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl IngestionServiceTrait for MockIngestionService {
    fn validate_request(&self, request: &IngestRequest) -> Result<(), IngestionServiceError> {
        if request.device_id.is_empty() || request.hr == 0 || request.spo2 == 0 {
            return Err(IngestionServiceError::ValidationError(
                "device_id, hr and spo2 are required".to_string(),
            ));
        }
        Ok(())
    }

    async fn ingest(&self, request: IngestRequest) -> Result<Reading, IngestionServiceError> {
        self.validate_request(&request)?;

        if self.should_fail_persistence {
            return Err(IngestionServiceError::PersistenceError(
                "Write failed - mock is configured to fail persistence".to_string(),
            ));
        }

        let reading = sample_reading(&request.device_id, request.hr, request.temp, request.spo2, Utc::now());
        if let Ok(mut stored) = self.stored.write() {
            stored.push(reading.clone());
        }
        Ok(reading)
    }
}

/// Mock implementation of the AnalyticsServiceTrait serving fixed batches
#[derive(Default)]
pub struct MockAnalyticsService {
    batches: HashMap<TimeWindow, Vec<Reading>>,
    should_fail: bool,
}

impl MockAnalyticsService {
    /// Create a mock with no readings in any window
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `readings` for `window`
    pub fn with_window(mut self, window: TimeWindow, readings: Vec<Reading>) -> Self {
        self.batches.insert(window, readings);
        self
    }

    /// Serve `readings` for every window
    pub fn with_readings(mut self, readings: Vec<Reading>) -> Self {
        for window in TimeWindow::ALL {
            self.batches.insert(window, readings.clone());
        }
        self
    }

    /// Configure the mock to fail every fetch
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

#[async_trait]
impl AnalyticsServiceTrait for MockAnalyticsService {
    async fn fetch_window(&self, window: TimeWindow) -> Result<Vec<Reading>, AnalyticsServiceError> {
        if self.should_fail {
            return Err(AnalyticsServiceError::PersistenceError("Mock datastore unavailable".to_string()));
        }
        Ok(self.batches.get(&window).cloned().unwrap_or_default())
    }

    async fn live_devices(&self) -> Result<Vec<DeviceCard>, AnalyticsServiceError> {
        if self.should_fail {
            return Err(AnalyticsServiceError::PersistenceError("Mock datastore unavailable".to_string()));
        }

        let mut latest: Vec<Reading> = Vec::new();
        for reading in self.batches.values().flatten() {
            match latest.iter_mut().find(|r| r.device_id == reading.device_id) {
                Some(existing) if existing.created_at < reading.created_at => *existing = reading.clone(),
                Some(_) => {}
                None => latest.push(reading.clone()),
            }
        }
        latest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(latest.into_iter().map(device_card).collect())
    }
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    /// Database component status
    database_status: ComponentStatus,
    /// System status
    system_status: SystemStatus,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            system_status: SystemStatus::Healthy,
        }
    }

    /// Configure the mock with a degraded database
    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self.system_status = SystemStatus::Degraded;
        self
    }

    /// Configure the mock with an unhealthy database
    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self.system_status = SystemStatus::Unhealthy;
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let details = match self.database_status {
            ComponentStatus::Healthy => None,
            ComponentStatus::Degraded => Some("Database is answering slowly".to_string()),
            ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
        };

        SystemHealth {
            status: self.system_status.clone(),
            components: HashMap::from([(
                "database".to_string(),
                HealthComponent { status: self.database_status.clone(), details },
            )]),
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}
