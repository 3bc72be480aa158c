use axum::{extract::State, Json};
use tracing::{error, instrument};

use crate::api::routes::AppState;
use crate::entities::common::ErrorResponse;
use crate::entities::live::{LiveDevice, LiveResponse};

/// Latest reading of every device with status colours
#[utoipa::path(
    get,
    path = "/api/live",
    responses(
        (status = 200, description = "Latest reading per device", body = LiveResponse),
        (status = 503, description = "Readings could not be loaded", body = ErrorResponse),
    ),
    tag = "analytics"
)]
#[instrument(skip(state))]
pub async fn get_live(State(state): State<AppState>) -> Result<Json<LiveResponse>, ErrorResponse> {
    let cards = state.analytics.live_devices().await.map_err(|e| {
        error!("Failed to load live devices: {}", e);
        ErrorResponse::service_unavailable()
    })?;

    Ok(Json(LiveResponse {
        devices: cards.into_iter().map(LiveDevice::from).collect(),
    }))
}
