//! Domain layer health check functionality
//! This module provides health check services for the application

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::warn;
use wristband_monitor_data::repository::ReadingRepositoryTrait;

/// Ping latency above which the database is reported as degraded
pub const SLOW_PING_THRESHOLD: Duration = Duration::from_millis(500);

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is functioning but with reduced performance
    Degraded,
    /// Component is not functioning
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    /// Status of the component
    pub status: ComponentStatus,
    /// Optional details about the component status
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    /// Overall system status
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    /// Returns true if the database is healthy, false if it answers slowly
    /// Returns an error if the database cannot be reached
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Worst status among the components
pub fn overall_status<'a>(components: impl IntoIterator<Item = &'a HealthComponent>) -> SystemStatus {
    let mut status = SystemStatus::Healthy;
    for component in components {
        match component.status {
            ComponentStatus::Unhealthy => return SystemStatus::Unhealthy,
            ComponentStatus::Degraded => status = SystemStatus::Degraded,
            ComponentStatus::Healthy => {}
        }
    }
    status
}

/// Health service that pings the reading repository
#[derive(Debug)]
pub struct RepositoryHealthService<R> {
    repository: R,
    backend: String,
}

impl<R: ReadingRepositoryTrait + std::fmt::Debug> RepositoryHealthService<R> {
    /// `backend` is reported as the database details when healthy
    pub fn new(repository: R, backend: impl Into<String>) -> Self {
        Self { repository, backend: backend.into() }
    }
}

#[async_trait]
impl<R: ReadingRepositoryTrait + std::fmt::Debug> HealthServiceTrait for RepositoryHealthService<R> {
    async fn get_system_health(&self) -> SystemHealth {
        let db_component = match self.check_database_status().await {
            Ok(true) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: Some(self.backend.clone()),
            },
            Ok(false) => HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Database is available but answering slowly".to_string()),
            },
            Err(e) => HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            },
        };

        let components: HashMap<String, HealthComponent> =
            vec![("database".to_string(), db_component)].into_iter().collect();

        SystemHealth {
            status: overall_status(components.values()),
            components,
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        let started = Instant::now();
        self.repository.ping().await.map_err(|e| {
            warn!("Database health check failed: {}", e);
            format!("Database connection error: {}", e)
        })?;
        Ok(started.elapsed() <= SLOW_PING_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wristband_monitor_data::repository::tests::MockReadingRepository;
    use wristband_monitor_data::repository::ReadingRepository;

    #[tokio::test]
    async fn test_healthy_in_memory_repository() {
        let service = RepositoryHealthService::new(ReadingRepository::in_memory(), "In-memory store");
        let health = service.get_system_health().await;

        assert_eq!(health.status, SystemStatus::Healthy);
        let database = &health.components["database"];
        assert_eq!(database.status, ComponentStatus::Healthy);
        assert_eq!(database.details.as_deref(), Some("In-memory store"));
    }

    #[tokio::test]
    async fn test_unreachable_repository_is_unhealthy() {
        let service = RepositoryHealthService::new(
            MockReadingRepository::new().with_failure("connection refused"),
            "SQLite",
        );

        assert!(service.check_database_status().await.is_err());
        let health = service.get_system_health().await;
        assert_eq!(health.status, SystemStatus::Unhealthy);
        assert!(health.components["database"].details.as_deref().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_overall_status_takes_worst_component() {
        let healthy = HealthComponent { status: ComponentStatus::Healthy, details: None };
        let degraded = HealthComponent { status: ComponentStatus::Degraded, details: None };
        let unhealthy = HealthComponent { status: ComponentStatus::Unhealthy, details: None };

        assert_eq!(overall_status([&healthy]), SystemStatus::Healthy);
        assert_eq!(overall_status([&healthy, &degraded]), SystemStatus::Degraded);
        assert_eq!(overall_status([&degraded, &unhealthy, &healthy]), SystemStatus::Unhealthy);
    }
}
