use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, Utc};
use tracing::{debug, error, info, instrument};

use wristband_monitor_domain::services::dashboard::reduce;
use wristband_monitor_domain::services::{export_file_name, AnalyticsSnapshot};

use crate::api::routes::AppState;
use crate::entities::analytics::{AnalyticsQuery, AnalyticsResponse};
use crate::entities::common::ErrorResponse;

/// Fetch the requested window and reduce it under the requested device filter
async fn load_snapshot(state: &AppState, query: &AnalyticsQuery) -> Result<AnalyticsSnapshot, ErrorResponse> {
    let window = query.window(state.default_window)?;
    let device_filter = query.device_filter();

    let batch = state.analytics.fetch_window(window).await.map_err(|e| {
        error!("Analytics fetch failed for window {}: {}", window, e);
        ErrorResponse::service_unavailable()
    })?;

    debug!("Reducing {} readings for window {} and device {}", batch.len(), window, device_filter);
    Ok(reduce(window, device_filter, Arc::new(batch), Utc::now()))
}

/// Build a CSV download, or 204 when there is nothing to export
pub(crate) fn csv_response(csv: Option<String>) -> Response {
    match csv {
        Some(body) => {
            let disposition = format!("attachment; filename=\"{}\"", export_file_name(Utc::now()));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Analytics for a time window and device filter
#[utoipa::path(
    get,
    path = "/api/analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Analytics computed, possibly over zero readings", body = AnalyticsResponse),
        (status = 400, description = "Unknown time range", body = ErrorResponse),
        (status = 503, description = "Readings could not be loaded", body = ErrorResponse),
    ),
    tag = "analytics"
)]
#[instrument(skip(state))]
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ErrorResponse> {
    let snapshot = load_snapshot(&state, &query).await?;
    info!(
        "Analytics for window {} device {}: {} readings",
        snapshot.window, snapshot.device_filter, snapshot.stats.total_readings
    );
    Ok(Json(AnalyticsResponse::from_snapshot(&snapshot, &Local)))
}

/// CSV export of the filtered readings for a time window and device filter
#[utoipa::path(
    get,
    path = "/api/analytics/export",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "CSV of the filtered readings", content_type = "text/csv", body = String),
        (status = 204, description = "No readings to export"),
        (status = 400, description = "Unknown time range", body = ErrorResponse),
        (status = 503, description = "Readings could not be loaded", body = ErrorResponse),
    ),
    tag = "analytics"
)]
#[instrument(skip(state))]
pub async fn export_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Response, ErrorResponse> {
    let snapshot = load_snapshot(&state, &query).await?;
    Ok(csv_response(snapshot.to_csv()))
}
