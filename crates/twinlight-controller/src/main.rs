//! # twinlight controller
//!
//! Serves the traffic light dashboard backed by the cluster's device registry.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use twinlight_adapter_kube::KubeClient;
use twinlight_controller::{router, ControllerConfig, Dashboard, TwinController};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting twinlight controller"
    );

    let config = ControllerConfig::from_env()?;

    let registry =
        KubeClient::new(config.registry.clone()).context("Failed to create registry client")?;

    let controller = TwinController::new(registry, &config.device_id, &config.property)
        .with_policy(config.read_failure);

    tracing::info!(
        device_id = %config.device_id,
        property = %config.property,
        api_server = %config.registry.api_server,
        policy = ?config.read_failure,
        "Controller initialized"
    );

    let app = router(Arc::new(Dashboard {
        controller,
        refresh_secs: config.refresh_secs,
    }));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    tracing::info!(bind = %config.bind, "Dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Dashboard server failed")?;

    tracing::info!("Controller stopped");
    Ok(())
}
