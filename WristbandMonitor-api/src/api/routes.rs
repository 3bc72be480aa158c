use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, put},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use wristband_monitor_data::repository::ReadingRepository;
use wristband_monitor_domain::entities::TimeWindow;
use wristband_monitor_domain::health::RepositoryHealthService;
use wristband_monitor_domain::services::{
    create_analytics_service, create_ingestion_service, AnalyticsServiceTrait, DashboardMonitor,
    IngestionServiceTrait,
};

use crate::api::handlers::{analytics, dashboard, health, ingest, live};
use crate::openapi::configure_swagger_routes;

/// Services shared by the request handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<dyn IngestionServiceTrait>,
    pub analytics: Arc<dyn AnalyticsServiceTrait>,
    pub dashboard: Arc<DashboardMonitor>,
    /// Window used when a request names none
    pub default_window: TimeWindow,
}

impl AppState {
    /// Wire the services together; the dashboard reads through `analytics`
    pub fn new(
        ingestion: Arc<dyn IngestionServiceTrait>,
        analytics: Arc<dyn AnalyticsServiceTrait>,
        default_window: TimeWindow,
    ) -> Self {
        let dashboard = Arc::new(DashboardMonitor::new(Arc::clone(&analytics), default_window));
        Self {
            ingestion,
            analytics,
            dashboard,
            default_window,
        }
    }

    /// Build the state and health service over one repository
    pub fn from_repository(repository: ReadingRepository, default_window: TimeWindow) -> (Self, health::HealthService) {
        let backend = repository.describe();
        let state = Self::new(
            Arc::new(create_ingestion_service(repository.clone())),
            Arc::new(create_analytics_service(repository.clone())),
            default_window,
        );
        let health_service: health::HealthService = Arc::new(RepositoryHealthService::new(repository, backend));
        (state, health_service)
    }
}

/// Create the application router
pub fn create_app(state: AppState, health_service: health::HealthService) -> Router {
    debug!("Creating application router");

    let api_routes = Router::new()
        .route("/data", get(ingest::ingest_reading))
        .route("/analytics", get(analytics::get_analytics))
        .route("/analytics/export", get(analytics::export_analytics))
        .route("/live", get(live::get_live))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/dashboard/window", put(dashboard::change_window))
        .route("/dashboard/device", put(dashboard::change_device_filter))
        .route("/dashboard/export", get(dashboard::export_dashboard));

    debug!("API routes configured");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(health_service));

    let app = Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .with_state(state);

    // Configure the Swagger UI using the helper function
    let app = add_swagger_ui(app);
    debug!("Swagger UI merged");

    // Uptime in /health counts from here
    health::mark_server_start();

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::PUT])
            .allow_headers(Any),
    )
    .layer(TraceLayer::new_for_http())
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}
