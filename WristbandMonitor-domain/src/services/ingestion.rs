use thiserror::Error;
use tracing::{debug, error, info, warn};
use chrono::Utc;
use validator::Validate;
use async_trait::async_trait;

use crate::entities::conversions;
use crate::entities::reading::{IngestRequest, Reading};
use crate::services::vitals::estimate_blood_pressure;
use wristband_monitor_data::repository::{ReadingRepositoryTrait, RepositoryError};

/// Ingestion service errors
#[derive(Debug, Error)]
pub enum IngestionServiceError {
    /// A required field is missing or zero
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The datastore rejected the write
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl From<RepositoryError> for IngestionServiceError {
    fn from(err: RepositoryError) -> Self {
        IngestionServiceError::PersistenceError(err.to_string())
    }
}

/// Trait for ingestion service operations
#[async_trait]
pub trait IngestionServiceTrait: Send + Sync {
    /// Check that a request carries a device id and non-zero hr and spo2
    fn validate_request(&self, request: &IngestRequest) -> Result<(), IngestionServiceError>;

    /// Validate, derive blood pressure and store one reading
    async fn ingest(&self, request: IngestRequest) -> Result<Reading, IngestionServiceError>;
}

/// Ingestion service writing through a repository
pub struct IngestionService<R: ReadingRepositoryTrait> {
    repository: R,
}

impl<R: ReadingRepositoryTrait> IngestionService<R> {
    /// Create a new ingestion service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: ReadingRepositoryTrait> IngestionServiceTrait for IngestionService<R> {
    fn validate_request(&self, request: &IngestRequest) -> Result<(), IngestionServiceError> {
        if let Err(validation_errors) = request.validate() {
            let error_message = validation_errors
                .field_errors()
                .iter()
                .map(|(field, errors)| {
                    let error_msgs: Vec<String> = errors
                        .iter()
                        .map(|err| match &err.message {
                            Some(msg) => msg.to_string(),
                            None => format!("Invalid {}", field),
                        })
                        .collect();
                    format!("{}: {}", field, error_msgs.join(", "))
                })
                .collect::<Vec<String>>()
                .join("; ");

            return Err(IngestionServiceError::ValidationError(error_message));
        }

        // Zero is treated as a missing value, not as a measurement
        if request.hr == 0 {
            return Err(IngestionServiceError::ValidationError("hr: heart rate is required".to_string()));
        }
        if request.spo2 == 0 {
            return Err(IngestionServiceError::ValidationError("spo2: blood oxygen is required".to_string()));
        }

        Ok(())
    }

    async fn ingest(&self, request: IngestRequest) -> Result<Reading, IngestionServiceError> {
        if let Err(e) = self.validate_request(&request) {
            warn!("Rejected reading from device '{}': {}", request.device_id, e);
            return Err(e);
        }

        let blood_pressure = estimate_blood_pressure(request.hr, request.spo2);
        debug!(
            "Estimated blood pressure {}/{} for device {} (hr={}, spo2={})",
            blood_pressure.systolic, blood_pressure.diastolic, request.device_id, request.hr, request.spo2
        );

        let row = conversions::convert_to_data_new_reading(&request, blood_pressure, Utc::now());

        let stored = self.repository.insert(row).await.map_err(|e| {
            error!("Failed to store reading for device {}: {}", request.device_id, e);
            IngestionServiceError::from(e)
        })?;

        info!("Stored reading {} for device {}", stored.id, stored.device_id);
        Ok(conversions::convert_to_domain_reading(stored))
    }
}

/// Create an ingestion service over the given repository
pub fn create_ingestion_service<R>(repository: R) -> impl IngestionServiceTrait
where
    R: ReadingRepositoryTrait + 'static,
{
    IngestionService::new(repository)
}
