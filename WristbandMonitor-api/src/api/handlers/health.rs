use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{http::StatusCode, Extension, Json};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;

use wristband_monitor_domain::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemStatus};

/// Health service type for dependency injection
pub type HealthService = Arc<dyn HealthServiceTrait>;

static STARTED_AT: OnceCell<u64> = OnceCell::new();

/// Body of `GET /health`
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    /// "ok", "degraded" or "error"
    pub status: String,
    pub version: String,
    /// Unix seconds
    pub timestamp: u64,
    /// Seconds since the router was built
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    pub components: HealthComponents,
    pub environment: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthComponents {
    /// Reading datastore; `message` names the backend or the ping failure
    pub database: ComponentReport,
    pub api: ComponentReport,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentReport {
    fn ok() -> Self {
        Self { status: component_label(&ComponentStatus::Healthy).to_string(), message: None }
    }
}

impl From<&HealthComponent> for ComponentReport {
    fn from(component: &HealthComponent) -> Self {
        Self {
            status: component_label(&component.status).to_string(),
            message: component.details.clone(),
        }
    }
}

fn component_label(status: &ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "ok",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "error",
    }
}

fn system_label(status: &SystemStatus) -> &'static str {
    match status {
        SystemStatus::Healthy => "ok",
        SystemStatus::Degraded => "degraded",
        SystemStatus::Unhealthy => "error",
    }
}

fn system_status_code(status: &SystemStatus) -> StatusCode {
    match status {
        SystemStatus::Healthy => StatusCode::OK,
        SystemStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        SystemStatus::Unhealthy => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Remember when the server came up; later calls keep the first value
pub fn mark_server_start() {
    STARTED_AT.get_or_init(unix_now);
}

/// Report whether the reading datastore answers its ping
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Datastore answered promptly", body = HealthReport),
        (status = 503, description = "Datastore answered slowly", body = HealthReport),
        (status = 500, description = "Datastore unreachable", body = HealthReport)
    ),
    tag = "health"
)]
#[instrument(skip(health_service))]
pub async fn health_check(
    Extension(health_service): Extension<HealthService>,
) -> (StatusCode, Json<HealthReport>) {
    let health = health_service.get_system_health().await;
    let now = unix_now();

    let database = health
        .components
        .get("database")
        .map(ComponentReport::from)
        .unwrap_or_else(ComponentReport::ok);

    match health.status {
        SystemStatus::Healthy => debug!("Health check ok"),
        _ => warn!(
            "Health check {}: {}",
            system_label(&health.status),
            database.message.as_deref().unwrap_or("no details")
        ),
    }

    let report = HealthReport {
        status: system_label(&health.status).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime: STARTED_AT.get().map(|started| now.saturating_sub(*started)),
        // Serving this request is the api check
        components: HealthComponents { database, api: ComponentReport::ok() },
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    };

    (system_status_code(&health.status), Json(report))
}
