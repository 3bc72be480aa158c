use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Device ingestion
        crate::api::handlers::ingest::ingest_reading,

        // Analytics endpoints
        crate::api::handlers::analytics::get_analytics,
        crate::api::handlers::analytics::export_analytics,
        crate::api::handlers::live::get_live,

        // Dashboard endpoints
        crate::api::handlers::dashboard::get_dashboard,
        crate::api::handlers::dashboard::change_window,
        crate::api::handlers::dashboard::change_device_filter,
        crate::api::handlers::dashboard::export_dashboard
    ),
    components(
        schemas(
            // Entities
            crate::entities::common::ErrorResponse,
            crate::entities::analytics::AnalyticsResponse,
            crate::entities::live::LiveDevice,
            crate::entities::live::LiveResponse,
            crate::entities::dashboard::DashboardResponse,
            crate::entities::dashboard::WindowChangeRequest,
            crate::entities::dashboard::DeviceFilterRequest,

            // Domain types embedded in responses
            wristband_monitor_domain::entities::Reading,
            wristband_monitor_domain::entities::SummaryStats,
            wristband_monitor_domain::entities::Trends,
            wristband_monitor_domain::entities::ChartRow,
            wristband_monitor_domain::entities::HistogramBucket,

            // Health handlers
            crate::api::handlers::health::HealthReport,
            crate::api::handlers::health::HealthComponents,
            crate::api::handlers::health::ComponentReport
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "ingestion", description = "Endpoint called by wristband devices"),
        (name = "analytics", description = "Windowed analytics, CSV export and live device view"),
        (name = "dashboard", description = "Server-side dashboard refreshed on a timer")
    ),
    info(
        title = "Wristband Monitor API",
        version = "0.1.0",
        description = "Ingests wristband vitals and serves analytics over them",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
