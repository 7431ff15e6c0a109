//! # twinlight device
//!
//! Device side of the twin: applies desired values delivered over MQTT and
//! periodically reports the value it actually holds.
//!
//! ## Architecture
//!
//! The device runs two concurrent loops sharing one [`DeviceAgent`]:
//! 1. **Listener**: polls the MQTT event loop and applies parsed commands
//! 2. **Reporter**: publishes the current value on a fixed interval and
//!    redraws the light panel

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod broker;
pub mod config;
pub mod panel;
pub mod reporter;
pub mod runtime;

pub use agent::DeviceAgent;
pub use broker::{parse_broker_url, BrokerUrlError, MqttReportSink};
pub use config::{DeviceConfig, PanelKind};
pub use panel::{LightPanel, LogPanel, TerminalPanel};
pub use reporter::{PublishError, ReportSink, Reporter};
pub use runtime::Device;
