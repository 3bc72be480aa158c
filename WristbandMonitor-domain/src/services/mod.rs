pub mod analytics;
pub mod dashboard;
pub mod export;
pub mod ingestion;
pub mod vitals;

// Domain services
// Ingestion writes readings; analytics, export and dashboard only read them.

// Re-export service traits and factory functions
pub use analytics::{AnalyticsService, AnalyticsServiceError, AnalyticsServiceTrait, create_analytics_service};
pub use dashboard::{AnalyticsSnapshot, AnalyticsState, DashboardMonitor, DashboardSession, DashboardView, FetchTicket};
pub use export::{export_csv, export_file_name};
pub use ingestion::{IngestionService, IngestionServiceError, IngestionServiceTrait, create_ingestion_service};
