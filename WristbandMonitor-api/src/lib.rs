// WristbandMonitor-api lib.rs
//
// HTTP surface of the wristband monitor: device ingestion, analytics,
// the server-side dashboard and health checks.

// Public modules
pub mod api;
pub mod config;
pub mod entities;
pub mod openapi;
