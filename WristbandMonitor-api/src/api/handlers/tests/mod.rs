use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use wristband_monitor_domain::entities::TimeWindow;
use wristband_monitor_domain::services::{AnalyticsServiceTrait, IngestionServiceTrait};
use wristband_monitor_domain::testing::MockHealthService;

use crate::api::{create_app, AppState};

mod health_test;

/// Router over the given services with a healthy mock health service
pub(super) fn test_app(
    ingestion: Arc<dyn IngestionServiceTrait>,
    analytics: Arc<dyn AnalyticsServiceTrait>,
) -> (Router, AppState) {
    let state = AppState::new(ingestion, analytics, TimeWindow::TwentyFourHours);
    let app = create_app(state.clone(), Arc::new(MockHealthService::new()));
    (app, state)
}

pub(super) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("Failed to parse response as JSON: {}\nResponse body: {}", e, self.body))
    }
}

pub(super) async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
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
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}
