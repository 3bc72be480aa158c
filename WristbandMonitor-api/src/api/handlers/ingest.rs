use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use tracing::{error, info, instrument, warn};

use wristband_monitor_domain::entities::IngestRequest;
use wristband_monitor_domain::services::IngestionServiceError;

use crate::api::routes::AppState;
use crate::entities::ingest::IngestQuery;

/// Store one reading sent by a wristband
///
/// Devices call this with query parameters only; the body is plain text.
#[utoipa::path(
    get,
    path = "/api/data",
    params(IngestQuery),
    responses(
        (status = 200, description = "Reading stored", body = String, example = json!("OK")),
        (status = 400, description = "id, hr or spo2 missing or zero", body = String, example = json!("Missing data")),
        (status = 500, description = "Reading could not be stored", body = String, example = json!("Error")),
    ),
    tag = "ingestion"
)]
#[instrument(skip(state))]
pub async fn ingest_reading(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
) -> (StatusCode, &'static str) {
    let request = IngestRequest::from(&query);

    match state.ingestion.ingest(request).await {
        Ok(reading) => {
            info!(
                "Reading ingested: device={} hr={} spo2={} bp={}/{}",
                reading.device_id, reading.hr, reading.spo2, reading.bp_sys, reading.bp_dia
            );
            (StatusCode::OK, "OK")
        }
        Err(IngestionServiceError::ValidationError(msg)) => {
            warn!("Rejected reading: {}", msg);
            (StatusCode::BAD_REQUEST, "Missing data")
        }
        Err(IngestionServiceError::PersistenceError(msg)) => {
            error!("Failed to persist reading: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error")
        }
    }
}
