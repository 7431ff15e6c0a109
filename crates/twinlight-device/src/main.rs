//! # twinlight device
//!
//! Simulated traffic light: applies desired colors received over MQTT and
//! reports the color it shows every few seconds.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use twinlight_device::{Device, DeviceConfig, LightPanel, LogPanel, PanelKind, TerminalPanel};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to the terminal panel
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting twinlight device"
    );

    let config = DeviceConfig::from_env()?;

    let panel: Box<dyn LightPanel> = match config.panel {
        PanelKind::Terminal => Box::new(TerminalPanel::new(&config.device_id)),
        PanelKind::Log => Box::new(LogPanel),
    };

    tracing::info!(
        device_id = %config.device_id,
        property = %config.property,
        panel = ?config.panel,
        "Device initialized"
    );

    Device::new(config).run(panel).await
}
