use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use wristband_monitor_api::api::{create_app, AppState};
use wristband_monitor_data::database::{initialize_database_pool, DatabaseConfig};
use wristband_monitor_data::repository::ReadingRepository;
use wristband_monitor_domain::entities::TimeWindow;

fn memory_app() -> (Router, AppState) {
    let (state, health) = AppState::from_repository(ReadingRepository::in_memory(), TimeWindow::TwentyFourHours);
    (create_app(state.clone(), health), state)
}

fn sqlite_app() -> (Router, AppState) {
    let pool = initialize_database_pool(&DatabaseConfig::sqlite_in_memory()).expect("in-memory SQLite pool");
    let (state, health) = AppState::from_repository(ReadingRepository::with_pool(pool), TimeWindow::TwentyFourHours);
    (create_app(state.clone(), health), state)
}

async fn request(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn ingest_three_w1_readings(app: &Router) {
    for hr in [65, 70, 75] {
        let uri = format!("/api/data?id=W1&hr={}&temp=36.6&spo2=98", hr);
        let (status, body) = request(app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }
}

async fn assert_w1_summary(app: &Router) {
    let (status, body) = request(app, Method::GET, "/api/analytics?range=1h&device=ALL", None).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    let stats = &json["stats"];
    assert_eq!(stats["total_readings"], 3);
    assert_eq!(stats["avg_hr"], 70.0);
    assert_eq!(stats["min_hr"], 65);
    assert_eq!(stats["max_hr"], 75);
    assert_eq!(stats["devices"], 1);
    assert_eq!(stats["trends"]["hr"], 7.1);

    let hrs: Vec<i64> = json["chart"].as_array().unwrap().iter().map(|r| r["hr"].as_i64().unwrap()).collect();
    assert_eq!(hrs, vec![65, 70, 75]);
    assert_eq!(json["chart"][0]["bp_sys"], 96);
}

#[tokio::test]
async fn test_end_to_end_in_memory() {
    let (app, _) = memory_app();
    ingest_three_w1_readings(&app).await;
    assert_w1_summary(&app).await;
}

#[tokio::test]
async fn test_end_to_end_sqlite() {
    let (app, _) = sqlite_app();
    ingest_three_w1_readings(&app).await;
    assert_w1_summary(&app).await;

    let (status, body) = request(&app, Method::GET, "/api/analytics/export?range=1h", None).await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[3].starts_with("W1,75,36.6,98,"));
    assert!(lines[3].ends_with('Z'));
}

#[tokio::test]
async fn test_rejected_readings_are_not_stored() {
    let (app, _) = sqlite_app();

    let (status, body) = request(&app, Method::GET, "/api/data?id=W1&hr=0&spo2=98", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing data");

    let (status, _) = request(&app, Method::GET, "/api/analytics/export?range=7d", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_live_view_orders_devices_by_activity() {
    let (app, _) = memory_app();

    for uri in [
        "/api/data?id=W1&hr=80&temp=36.8&spo2=98",
        "/api/data?id=W2&hr=110&temp=38.0&spo2=93",
        "/api/data?id=W1&hr=72&temp=36.6&spo2=98",
    ] {
        let (status, _) = request(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = request(&app, Method::GET, "/api/live", None).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    let devices = json["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["device_id"], "W1");
    assert_eq!(devices[0]["latest"]["hr"], 72);
    assert_eq!(devices[1]["device_id"], "W2");
    assert_eq!(devices[1]["hr_color"], "red");
    assert_eq!(devices[1]["spo2_color"], "red");
}

#[tokio::test]
async fn test_dashboard_refresh_picks_up_new_readings() {
    let (app, state) = memory_app();

    assert!(state.dashboard.refresh().await);
    let (_, body) = request(&app, Method::GET, "/api/dashboard", None).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "loaded");
    assert_eq!(json["analytics"]["stats"]["total_readings"], 0);

    ingest_three_w1_readings(&app).await;
    let (_, body) = request(&app, Method::PUT, "/api/dashboard/device", Some(json!({ "device": "W1" }))).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    // Filter changes reuse the loaded batch
    assert_eq!(json["analytics"]["stats"]["total_readings"], 0);

    assert!(state.dashboard.refresh().await);
    let (_, body) = request(&app, Method::GET, "/api/dashboard", None).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["device_filter"], "W1");
    assert_eq!(json["analytics"]["stats"]["total_readings"], 3);
}

#[tokio::test]
async fn test_health_reports_datastore() {
    let (app, _) = sqlite_app();

    let (status, body) = request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["components"]["database"]["message"].as_str().unwrap().contains("SQLite"));
}

#[tokio::test]
async fn test_swagger_document_is_served() {
    let (app, _) = memory_app();

    let (status, body) = request(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert!(json["paths"]["/api/data"].is_object());
}
