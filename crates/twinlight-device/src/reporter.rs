//! Periodic reporting of the device's current value.

use crate::agent::DeviceAgent;
use crate::panel::LightPanel;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use twinlight_proto::ReportMessage;

/// Default reporting interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

/// Publish errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    /// Report could not be encoded
    #[error("serialize error: {0}")]
    Serialize(String),

    /// Transport rejected the report
    #[error("publish error: {0}")]
    Publish(String),
}

/// Destination for reports.
pub trait ReportSink: Send + Sync {
    /// Publish one report.
    fn publish(
        &self,
        report: &ReportMessage,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// Publishes the agent's value on a fixed interval.
pub struct Reporter<S, P> {
    agent: DeviceAgent,
    sink: S,
    panel: P,
    interval: Duration,
}

impl<S: ReportSink, P: LightPanel> Reporter<S, P> {
    /// Create a reporter.
    #[must_use]
    pub fn new(agent: DeviceAgent, sink: S, panel: P, interval: Duration) -> Self {
        Self {
            agent,
            sink,
            panel,
            interval,
        }
    }

    /// Reporting interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Report once: publish the current value, then draw it.
    ///
    /// Publish failures are logged; the returned report is the one attempted.
    pub async fn tick(&self) -> ReportMessage {
        let value = self.agent.current();
        let report = ReportMessage::new(self.agent.property(), value.as_str());

        match self.sink.publish(&report).await {
            Ok(()) => {
                tracing::debug!(event_id = %report.event_id, value = %value, "Published report");
            }
            Err(err) => {
                tracing::warn!(error = %err, value = %value, "Failed to publish report");
            }
        }

        self.panel.show(&value);
        report
    }

    /// Report forever at the configured interval, starting immediately.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_ms = self.interval.as_millis(), "Reporter started");

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use twinlight_core::CommandParser;

    #[derive(Clone, Default)]
    struct CapturingSink {
        reports: Arc<Mutex<Vec<ReportMessage>>>,
    }

    impl CapturingSink {
        fn values(&self) -> Vec<String> {
            self.reports
                .lock()
                .unwrap()
                .iter()
                .filter_map(|r| r.actual("color").map(str::to_string))
                .collect()
        }
    }

    impl ReportSink for CapturingSink {
        async fn publish(&self, report: &ReportMessage) -> Result<(), PublishError> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FailingSink {
        attempts: Arc<AtomicUsize>,
    }

    impl ReportSink for FailingSink {
        async fn publish(&self, _report: &ReportMessage) -> Result<(), PublishError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(PublishError::Publish("broker down".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingPanel {
        shown: Arc<Mutex<Vec<String>>>,
    }

    impl LightPanel for RecordingPanel {
        fn show(&self, value: &str) {
            self.shown.lock().unwrap().push(value.to_string());
        }
    }

    fn agent() -> DeviceAgent {
        DeviceAgent::new(CommandParser::new("color"))
    }

    #[tokio::test]
    async fn tick_reports_current_value() {
        let agent = agent();
        let sink = CapturingSink::default();
        let panel = RecordingPanel::default();
        let reporter = Reporter::new(agent.clone(), sink.clone(), panel.clone(), DEFAULT_INTERVAL);

        reporter.tick().await;
        agent.apply("GREEN");
        let report = reporter.tick().await;

        assert_eq!(report.actual("color"), Some("GREEN"));
        assert_eq!(sink.values(), vec!["WAITING", "GREEN"]);
        assert_eq!(*panel.shown.lock().unwrap(), vec!["WAITING", "GREEN"]);
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_ticks() {
        let sink = FailingSink::default();
        let panel = RecordingPanel::default();
        let reporter = Reporter::new(agent(), sink.clone(), panel.clone(), DEFAULT_INTERVAL);

        for _ in 0..3 {
            reporter.tick().await;
        }

        assert_eq!(sink.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(panel.shown.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn run_keeps_fixed_cadence() {
        let agent = agent();
        let sink = CapturingSink::default();
        let reporter = Reporter::new(
            agent.clone(),
            sink.clone(),
            RecordingPanel::default(),
            DEFAULT_INTERVAL,
        );
        let task = tokio::spawn(reporter.run());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        agent.apply("RED");
        tokio::time::sleep(Duration::from_millis(5000)).await;
        task.abort();

        assert_eq!(sink.values(), vec!["WAITING", "RED", "RED"]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_survives_publish_failures() {
        let sink = FailingSink::default();
        let reporter = Reporter::new(
            agent(),
            sink.clone(),
            RecordingPanel::default(),
            Duration::from_millis(100),
        );
        let task = tokio::spawn(reporter.run());

        tokio::time::sleep(Duration::from_millis(950)).await;
        task.abort();

        assert_eq!(sink.attempts.load(Ordering::SeqCst), 10);
    }
}
