use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_backend::infrastructure::OverdueMonitor;
use helpdesk_backend::presentation::router;
use helpdesk_backend::{AppConfig, AppState, HelpdeskError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_address();
    let scan_interval = Duration::from_secs(config.monitor.overdue_scan_interval_seconds);

    tracing::info!("Starting Helpdesk Backend");
    tracing::info!("Environment: {:?}", config.server.environment);
    tracing::info!("Storage backend: {:?}", config.database.backend);

    let app_state = Arc::new(AppState::new(config).await?);
    let monitor = OverdueMonitor::new(app_state.ticket_service.clone(), scan_interval).start();
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| HelpdeskError::Configuration {
            message: format!("Failed to bind to {}: {}", bind_addr, e),
        })?;

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HelpdeskError::Internal {
            message: format!("Server error: {}", e),
        })?;

    monitor.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,hyper=info,tower=info,mongodb=info".into()
        } else {
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(true),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
