// Wristband Monitor Data
// This crate handles datastore access for wristband readings

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
