use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use apartment_notification_service::config::Settings;
use apartment_notification_service::server::{create_app, AppState};
use apartment_notification_service::shutdown::{GracefulShutdown, ShutdownConfig};
use apartment_notification_service::telemetry::{init_tracing, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(LogFormat::from_env());

    // Load configuration
    let settings = Settings::new()?;
    tracing::info!("Configuration loaded");

    // Create application state
    let state = AppState::new(settings.clone());
    tracing::info!("Application state initialized");

    let shutdown = GracefulShutdown::with_config(
        state.hub.clone(),
        ShutdownConfig {
            reconnect_after_seconds: settings.sse.reconnect_after_seconds,
            ..ShutdownConfig::default()
        },
    );

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Open SSE streams must be closed before axum can finish draining
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let reason = shutdown_signal().await;
            shutdown.execute(reason).await;
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
            "interrupted"
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
            "server shutting down"
        }
    }
}
