pub mod analytics;
pub mod dashboard;
pub mod health;
pub mod ingest;
pub mod live;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use analytics::{export_analytics, get_analytics};
pub use dashboard::{change_device_filter, change_window, export_dashboard, get_dashboard};
pub use health::health_check;
pub use ingest::ingest_reading;
pub use live::get_live;
