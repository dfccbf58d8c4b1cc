use anyhow::{Context, Result};
use processor::{config::Config, health, state::AppState};
use shared::{
    config::{ConnectionManager, run_migrations},
    utils::{Telemetry, init_logger, shutdown_signal},
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const SERVICE_NAME: &str = "order-processor";

#[tokio::main]
async fn main() -> Result<()> {
    let (config, state, telemetry, _log_guard) =
        setup().await.context("Failed to setup application")?;

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    let handles = run_workers(&config, state, &shutdown_tx).context("Failed to start workers")?;

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

    shutdown(telemetry, handles).await;

    Ok(())
}

async fn setup() -> Result<(Config, Arc<AppState>, Telemetry, Option<WorkerGuard>)> {
    dotenv::dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;

    let telemetry = Telemetry::init(SERVICE_NAME, &config.otel_endpoint)
        .context("Failed to initialize telemetry")?;

    let log_guard = init_logger(
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

    let state = Arc::new(
        AppState::new(db_pool, config.clone()).context("Failed to create AppState")?,
    );

    info!("✅ Application setup completed successfully.");
    Ok((config, state, telemetry, log_guard))
}

fn run_workers(
    config: &Config,
    state: Arc<AppState>,
    shutdown_tx: &broadcast::Sender<()>,
) -> Result<Vec<JoinHandle<()>>> {
    let health_addr = config.health_addr()?;
    let health_state = state.health_state();
    let health_shutdown = shutdown_tx.subscribe();
    let health_failed_tx = shutdown_tx.clone();

    let health_handle = tokio::spawn(async move {
        if let Err(e) = health::serve(health_addr, health_state, health_shutdown).await {
            error!("Health server failed: {e:#}");
            let _ = health_failed_tx.send(());
        }
    });

    let poller = state.poller();
    let poller_shutdown = shutdown_tx.subscribe();

    let poller_handle = tokio::spawn(async move {
        poller.run(poller_shutdown).await;
    });

    Ok(vec![health_handle, poller_handle])
}

async fn shutdown(telemetry: Telemetry, handles: Vec<JoinHandle<()>>) {
    info!("🛑 Shutting down order processor...");

    let shutdown_timeout = Duration::from_secs(30);
    let joined = tokio::time::timeout(shutdown_timeout, async {
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task panicked: {e}");
            }
        }
    })
    .await;

    match joined {
        Ok(()) => info!("✅ All workers stopped gracefully."),
        Err(_) => warn!("⚠️  Shutdown timeout reached, forcing exit."),
    }

    if let Err(e) = telemetry.shutdown() {
        error!("Failed to shutdown telemetry: {e}");
    }

    info!("✅ Order processor shutdown complete.");
}
