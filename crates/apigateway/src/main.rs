use anyhow::{Context, Result};
use apigateway::{config::Config, handler::AppRouter, state::AppState};
use dotenv::dotenv;
use shared::{
    config::{ConnectionManager, run_migrations},
    utils::{Telemetry, init_logger, shutdown_signal},
};
use std::time::Duration;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "apigateway";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;

    let telemetry = Telemetry::init(SERVICE_NAME, &config.otel_endpoint)
        .context("Failed to initialize telemetry")?;

    let _log_guard = init_logger(
        telemetry.logger_provider(),
        SERVICE_NAME,
        config.is_dev,
        config.enable_file_log,
    )?;

    let db_pool = ConnectionManager::new_pool(&config.database)
        .await
        .context("Failed to initialize database pool")?;

    if config.database.run_migrations {
        run_migrations(&db_pool)
            .await
            .context("Failed to migrate database")?;
    }

    let state = AppState::new(db_pool, config.queue.clone(), &config.jwt_secret);

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    let server_handle = run_server(config.port, state, &shutdown_tx);

    info!("🚀 Server started successfully");

    tokio::select! {
        _ = shutdown_signal() => {
            info!("🛑 Shutdown signal received.");
        }
        _ = shutdown_rx.recv() => {
            info!("🛑 Shutdown signal received from internal component.");
        }
    }

    if let Err(e) = shutdown_tx.send(()) {
        warn!("Failed to broadcast shutdown signal: {e}");
    }

    shutdown(telemetry, server_handle).await;

    Ok(())
}

fn run_server(port: u16, state: AppState, shutdown_tx: &broadcast::Sender<()>) -> JoinHandle<()> {
    let server_shutdown = shutdown_tx.subscribe();
    let server_failed_tx = shutdown_tx.clone();

    tokio::spawn(async move {
        if let Err(e) = AppRouter::serve(port, state, server_shutdown).await {
            error!("HTTP server failed: {e:#}");
            let _ = server_failed_tx.send(());
        }
    })
}

async fn shutdown(telemetry: Telemetry, server_handle: JoinHandle<()>) {
    info!("Shutting down servers...");

    match tokio::time::timeout(Duration::from_secs(30), server_handle).await {
        Ok(Ok(())) => info!("✅ HTTP server stopped gracefully."),
        Ok(Err(e)) => error!("HTTP server task panicked: {e}"),
        Err(_) => warn!("⚠️  Shutdown timeout reached, forcing exit."),
    }

    if let Err(e) = telemetry.shutdown() {
        error!("Failed to shutdown telemetry: {e}");
    }

    info!("✅ API gateway shutdown complete.");
}
