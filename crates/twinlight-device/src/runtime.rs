//! Device runtime orchestration.

use crate::agent::DeviceAgent;
use crate::broker::{self, MqttReportSink};
use crate::config::DeviceConfig;
use crate::panel::LightPanel;
use crate::reporter::Reporter;
use anyhow::{Context, Result};
use rumqttc::{Event, Packet, QoS};
use std::time::Duration;
use twinlight_core::CommandParser;
use twinlight_proto::topics::MessageType;
use twinlight_proto::TopicScheme;
use uuid::Uuid;

/// Delay before polling the event loop again after a connection error.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// The device runtime.
pub struct Device {
    config: DeviceConfig,
    agent: DeviceAgent,
    topics: TopicScheme,
}

impl Device {
    /// Create a device from its configuration.
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        let agent = DeviceAgent::new(CommandParser::new(&config.property));
        Self {
            config,
            agent,
            topics: TopicScheme::default(),
        }
    }

    /// Handle to the device's state.
    #[must_use]
    pub fn agent(&self) -> &DeviceAgent {
        &self.agent
    }

    /// Apply `payload` if `topic` is this device's command topic.
    ///
    /// Returns the value applied, if any. Reports, other devices' commands
    /// and unrelated topics are ignored.
    pub fn dispatch(&self, topic: &str, payload: &[u8]) -> Option<String> {
        match self.topics.parse(topic) {
            Some((id, MessageType::Command)) if id == self.config.device_id => {
                self.agent.handle_command(payload)
            }
            _ => {
                tracing::debug!(topic, "Ignoring message on foreign topic");
                None
            }
        }
    }

    /// Run until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns error if the broker URL is invalid.
    pub async fn run<P: LightPanel + 'static>(self, panel: P) -> Result<()> {
        let device_id = self.config.device_id.as_str();
        let command_topic = self.topics.command(device_id);
        let report_topic = self.topics.report(device_id);
        let client_id = format!("twinlight-{device_id}-{}", Uuid::new_v4().simple());

        let (client, mut eventloop) = broker::connect(&self.config.mqtt_broker, &client_id)
            .context("Failed to create MQTT client")?;

        let reporter = Reporter::new(
            self.agent.clone(),
            MqttReportSink::new(client.clone(), &report_topic),
            panel,
            self.config.report_interval,
        );
        let reporter_task = tokio::spawn(reporter.run());

        tracing::info!(
            device_id,
            broker = %self.config.mqtt_broker,
            command_topic,
            report_topic,
            "Device running, press Ctrl+C to stop"
        );

        loop {
            tokio::select! {
                event = eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            tracing::info!(topic = %command_topic, "Connected, subscribing to commands");
                            if let Err(err) = client.try_subscribe(&command_topic, QoS::AtLeastOnce) {
                                tracing::warn!(error = %err, "Failed to subscribe to command topic");
                            }
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            tracing::debug!(
                                topic = %publish.topic,
                                payload_len = publish.payload.len(),
                                "Received message"
                            );
                            self.dispatch(&publish.topic, &publish.payload);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "MQTT error");
                            tokio::time::sleep(RETRY_DELAY).await;
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        reporter_task.abort();
        tracing::info!("Device stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinlight_proto::CommandShape;

    fn device() -> Device {
        Device::new(DeviceConfig {
            device_id: "light-01".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn own_command_is_applied() {
        let device = device();
        let topic = TopicScheme::default().command("light-01");
        let payload = CommandShape::Nested.encode("color", "RED").to_string();

        assert_eq!(device.dispatch(&topic, payload.as_bytes()).as_deref(), Some("RED"));
        assert_eq!(device.agent().current(), "RED");
    }

    #[test]
    fn other_topics_are_ignored() {
        let device = device();
        let scheme = TopicScheme::default();
        let payload = CommandShape::Nested.encode("color", "RED").to_string();

        for topic in [
            scheme.command("light-02"),
            scheme.report("light-01"),
            "sensors/light-01/color".to_string(),
            String::new(),
        ] {
            assert_eq!(device.dispatch(&topic, payload.as_bytes()), None, "{topic}");
        }
        assert_eq!(device.agent().current(), "WAITING");
    }

    #[test]
    fn unparseable_command_leaves_value() {
        let device = device();
        let topic = TopicScheme::default().command("light-01");

        assert_eq!(device.dispatch(&topic, b"not json"), None);
        assert_eq!(device.agent().current(), "WAITING");
    }
}
