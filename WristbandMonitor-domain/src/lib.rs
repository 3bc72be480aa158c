// Wristband Monitor Domain
// This crate contains ingestion, analytics and dashboard logic for the wristband monitor

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the database module from the data layer for convenience
pub use wristband_monitor_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
