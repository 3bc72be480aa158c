use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    routing::get,
    Extension, Router,
};

use wristband_monitor_domain::testing::MockHealthService;

use crate::api::handlers::health::{health_check, mark_server_start, HealthService};

use super::send;

fn health_app(service: MockHealthService) -> Router {
    let service: HealthService = Arc::new(service);
    Router::new()
        .route("/health", get(health_check))
        .layer(Extension(service))
}

#[tokio::test]
async fn test_health_check_healthy() {
    let response = send(&health_app(MockHealthService::new()), Method::GET, "/health", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["components"]["database"]["status"], "ok");
    assert_eq!(json["components"]["api"]["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_check_degraded() {
    let response = send(
        &health_app(MockHealthService::new().with_degraded_database()),
        Method::GET,
        "/health",
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    let json = response.json();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["components"]["database"]["status"], "degraded");
    assert!(json["components"]["database"]["message"].is_string());
}

#[tokio::test]
async fn test_health_check_unhealthy() {
    let response = send(
        &health_app(MockHealthService::new().with_unhealthy_database()),
        Method::GET,
        "/health",
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["components"]["database"]["status"], "error");
}

#[tokio::test]
async fn test_health_check_reports_uptime_once_started() {
    mark_server_start();
    let response = send(&health_app(MockHealthService::new()), Method::GET, "/health", None).await;

    let json = response.json();
    assert!(json["uptime"].is_u64());
    assert!(json["components"]["database"].get("message").is_none());
    assert!(json["environment"].is_string());
}
