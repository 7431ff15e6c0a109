//! Device configuration.

use crate::reporter::DEFAULT_INTERVAL;
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;
use std::time::Duration;
use twinlight_core::{DEFAULT_DEVICE_ID, DEFAULT_PROPERTY};

/// How the device shows its value locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelKind {
    /// ANSI traffic light on stdout
    #[default]
    Terminal,
    /// Log lines only
    Log,
}

impl FromStr for PanelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminal" => Ok(Self::Terminal),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown panel '{other}'")),
        }
    }
}

/// Device configuration.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device identifier used in topics
    pub device_id: String,

    /// Twin property to track
    pub property: String,

    /// MQTT broker URL
    pub mqtt_broker: String,

    /// Report interval
    pub report_interval: Duration,

    /// Local panel
    pub panel: PanelKind,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.to_string(),
            property: DEFAULT_PROPERTY.to_string(),
            mqtt_broker: "tcp://127.0.0.1:1883".to_string(),
            report_interval: DEFAULT_INTERVAL,
            panel: PanelKind::default(),
        }
    }
}

impl DeviceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TWINLIGHT_DEVICE_ID`: Device identifier
    /// - `TWINLIGHT_PROPERTY`: Twin property name
    /// - `TWINLIGHT_MQTT_BROKER`: MQTT broker URL
    /// - `TWINLIGHT_REPORT_INTERVAL_MS`: Report interval in milliseconds
    /// - `TWINLIGHT_PANEL`: "terminal" or "log"
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(device_id) = lookup("TWINLIGHT_DEVICE_ID") {
            config.device_id = device_id;
        }

        if let Some(property) = lookup("TWINLIGHT_PROPERTY") {
            config.property = property;
        }

        if let Some(broker) = lookup("TWINLIGHT_MQTT_BROKER") {
            config.mqtt_broker = broker;
        }

        if let Some(ms) = lookup("TWINLIGHT_REPORT_INTERVAL_MS") {
            let ms: u64 = ms.parse().context("Invalid TWINLIGHT_REPORT_INTERVAL_MS")?;
            if ms == 0 {
                return Err(anyhow!("TWINLIGHT_REPORT_INTERVAL_MS must be positive"));
            }
            config.report_interval = Duration::from_millis(ms);
        }

        if let Some(panel) = lookup("TWINLIGHT_PANEL") {
            config.panel = panel
                .parse::<PanelKind>()
                .map_err(|e| anyhow!(e))
                .context("Invalid TWINLIGHT_PANEL")?;
        }

        Ok(config)
    }
}
