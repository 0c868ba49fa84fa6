//! Meridian cluster manager binary.
//!
//! Runs the scheduler service: node registration, pod placement, heartbeat
//! intake, and the background health monitor.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use meridian_scheduler::{api, ClusterRegistry, HealthMonitor, ManagerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("meridian_scheduler=info".parse()?),
        )
        .init();

    info!("Meridian cluster manager starting");

    // Load configuration
    let config: ManagerConfig = Figment::new()
        .merge(Toml::file("meridian.toml"))
        .merge(Env::prefixed("MERIDIAN_").split("_"))
        .extract()?;

    info!(listen_addr = %config.api.listen_addr, "Configuration loaded");

    // Create registry
    let registry = Arc::new(ClusterRegistry::new());
    info!("Cluster registry initialised");

    // Create health monitor
    let monitor = HealthMonitor::new(config.health.clone(), registry.clone());
    info!(
        monitor_interval_secs = config.health.monitor_interval.as_secs(),
        heartbeat_timeout_secs = config.health.heartbeat_timeout.as_secs(),
        "Health monitor initialised"
    );

    // Start the monitor loop
    let cancel = CancellationToken::new();
    let monitor_cancel = cancel.clone();
    let monitor_task = tokio::spawn(async move {
        monitor.run(monitor_cancel).await;
    });

    // Build application state
    let state = Arc::new(api::AppState {
        registry: registry.clone(),
        placement: config.placement.clone(),
    });

    // Build router
    let app = api::router(state);

    // Start HTTP server
    let listener = TcpListener::bind(&config.api.listen_addr).await?;
    info!(addr = %config.api.listen_addr, "Cluster API listening");

    let shutdown_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_cancel.cancel();
        })
        .await?;

    // Let the in-flight monitor tick finish before exiting
    cancel.cancel();
    monitor_task.await?;
    info!("Cluster manager shutdown complete");

    Ok(())
}
