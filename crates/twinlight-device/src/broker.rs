//! MQTT transport for the device.

use crate::reporter::{PublishError, ReportSink};
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use std::time::Duration;
use twinlight_proto::ReportMessage;
use url::Url;

const DEFAULT_PORT: u16 = 1883;

/// Broker URL could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid broker url: {0}")]
pub struct BrokerUrlError(String);

/// Create an MQTT client for `broker`.
///
/// Nothing is sent until the returned event loop is polled.
///
/// # Errors
///
/// Returns error if the broker URL is invalid.
pub fn connect(broker: &str, client_id: &str) -> Result<(AsyncClient, EventLoop), BrokerUrlError> {
    let (host, port) = parse_broker_url(broker)?;

    let mut options = MqttOptions::new(client_id, host, port);
    options.set_keep_alive(Duration::from_secs(30));

    Ok(AsyncClient::new(options, 100))
}

/// Split a broker address into host and port.
///
/// Accepts `tcp://host[:port]`, `mqtt://host[:port]` and bare `host[:port]`.
///
/// # Errors
///
/// Returns error for other schemes, a missing host or a bad port.
pub fn parse_broker_url(input: &str) -> Result<(String, u16), BrokerUrlError> {
    if input.contains("://") {
        let url = Url::parse(input).map_err(|e| BrokerUrlError(format!("{input}: {e}")))?;

        match url.scheme() {
            "tcp" | "mqtt" => {}
            scheme => {
                return Err(BrokerUrlError(format!(
                    "{input}: unsupported scheme '{scheme}'"
                )));
            }
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| BrokerUrlError(format!("{input}: missing host")))?;
        let port = url.port().unwrap_or(DEFAULT_PORT);

        return Ok((host.to_string(), port));
    }

    let mut parts = input.split(':');
    let host = parts
        .next()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BrokerUrlError(format!("{input}: missing host")))?;
    let port = match parts.next() {
        None => DEFAULT_PORT,
        Some(port) => port
            .parse()
            .map_err(|_| BrokerUrlError(format!("{input}: invalid port '{port}'")))?,
    };
    if parts.next().is_some() {
        return Err(BrokerUrlError(format!("{input}: too many ':' separators")));
    }

    Ok((host.to_string(), port))
}

/// Report sink publishing to the device's report topic.
#[derive(Clone)]
pub struct MqttReportSink {
    client: AsyncClient,
    topic: String,
}

impl MqttReportSink {
    /// Create a sink publishing to `topic`.
    #[must_use]
    pub fn new(client: AsyncClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

impl ReportSink for MqttReportSink {
    async fn publish(&self, report: &ReportMessage) -> Result<(), PublishError> {
        let payload = report
            .to_json()
            .map_err(|e| PublishError::Serialize(e.to_string()))?;

        self.client
            .publish(&self.topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| PublishError::Publish(e.to_string()))
    }
}
