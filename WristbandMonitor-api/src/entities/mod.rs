// Public entities for the Wristband Monitor API
// This module contains data structures that are shared across the application boundary

// Ingestion query parameters
pub mod ingest;

// Analytics and export payloads
pub mod analytics;

// Server-side dashboard session payloads
pub mod dashboard;

// Live device cards
pub mod live;

// Common entities for error handling
pub mod common;
