use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use tracing::{info, instrument, warn};

use wristband_monitor_domain::entities::{DeviceFilter, TimeWindow, UnknownTimeWindow};
use wristband_monitor_domain::services::AnalyticsState;

use crate::api::handlers::analytics::csv_response;
use crate::api::routes::AppState;
use crate::entities::common::ErrorResponse;
use crate::entities::dashboard::{DashboardResponse, DeviceFilterRequest, WindowChangeRequest};

/// Current state of the server-side dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard state: loading, loaded or failed", body = DashboardResponse),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let view = state.dashboard.view().await;
    Json(DashboardResponse::from_view(&view, &Local))
}

/// Select the dashboard time window and fetch it
#[utoipa::path(
    put,
    path = "/api/dashboard/window",
    request_body = WindowChangeRequest,
    responses(
        (status = 200, description = "Window changed", body = DashboardResponse),
        (status = 400, description = "Unknown time range", body = ErrorResponse),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn change_window(
    State(state): State<AppState>,
    Json(request): Json<WindowChangeRequest>,
) -> Result<Json<DashboardResponse>, ErrorResponse> {
    let window: TimeWindow = request.range.parse().map_err(|e: UnknownTimeWindow| {
        warn!("Rejected dashboard window: {}", e);
        ErrorResponse::bad_request(&e.to_string())
    })?;

    if !state.dashboard.change_window(window).await {
        info!("Window change to {} was superseded before its fetch completed", window);
    }

    let view = state.dashboard.view().await;
    Ok(Json(DashboardResponse::from_view(&view, &Local)))
}

/// Select the dashboard device filter; the loaded readings are reused
#[utoipa::path(
    put,
    path = "/api/dashboard/device",
    request_body = DeviceFilterRequest,
    responses(
        (status = 200, description = "Device filter changed", body = DashboardResponse),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn change_device_filter(
    State(state): State<AppState>,
    Json(request): Json<DeviceFilterRequest>,
) -> Json<DashboardResponse> {
    let view = state.dashboard.change_device_filter(DeviceFilter::from(request.device)).await;
    Json(DashboardResponse::from_view(&view, &Local))
}

/// CSV export of the dashboard's filtered readings
#[utoipa::path(
    get,
    path = "/api/dashboard/export",
    responses(
        (status = 200, description = "CSV of the filtered readings", content_type = "text/csv", body = String),
        (status = 204, description = "No readings to export"),
        (status = 503, description = "No readings loaded yet", body = ErrorResponse),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn export_dashboard(State(state): State<AppState>) -> Response {
    let view = state.dashboard.view().await;
    match &view.state {
        AnalyticsState::Loaded(snapshot) => csv_response(snapshot.to_csv()),
        AnalyticsState::Loading => ErrorResponse::service_unavailable()
            .with_details("Dashboard is still loading")
            .into_response(),
        AnalyticsState::Failed { reason } => ErrorResponse::service_unavailable()
            .with_details(reason.clone())
            .into_response(),
    }
}
