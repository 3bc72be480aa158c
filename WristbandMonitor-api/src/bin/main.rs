use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use wristband_monitor_api::api::{create_app, AppState};
use wristband_monitor_api::config::AppConfig;
use wristband_monitor_data::database::{initialize_database_pool, DatabaseType};
use wristband_monitor_data::repository::ReadingRepository;

/// The main entry point for the Wristband Monitor API server
///
/// This function:
/// 1. Initializes environment variables from .env file
/// 2. Sets up tracing for logging
/// 3. Opens the datastore and runs migrations
/// 4. Starts dashboard polling
/// 5. Serves the Axum application until a shutdown signal arrives
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    // Initialize tracing for structured logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(false)
            .with_timer(fmt::time::uptime())
            .with_writer(std::io::stdout))
        .with(env_filter)
        .init();

    info!("Starting Wristband Monitor API server");

    let config = AppConfig::from_env()?;
    info!("Environment: {}", config.environment);

    let repository = match config.database.db_type {
        DatabaseType::Sqlite => {
            if !config.data_dir.exists() {
                info!("Creating data directory: {}", config.data_dir.display());
                std::fs::create_dir_all(&config.data_dir)
                    .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;
            }
            let pool = initialize_database_pool(&config.database).map_err(|e| {
                error!("Failed to initialize database pool: {}", e);
                e
            })?;
            ReadingRepository::with_pool(pool)
        }
        DatabaseType::Memory => {
            warn!("DB_TYPE=memory, readings are kept in process memory only");
            ReadingRepository::in_memory()
        }
    };
    info!("Datastore: {}", repository.describe());

    let (state, health_service) = AppState::from_repository(repository, config.default_window);
    let poller = state.dashboard.clone().spawn_polling(config.refresh_interval);

    let app = create_app(state, health_service);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve the application with graceful shutdown support
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Sets up a signal handler for graceful shutdown
///
/// Returns once CTRL+C or, on Unix, SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
}
