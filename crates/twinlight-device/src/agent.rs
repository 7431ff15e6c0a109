//! Device-side twin state.

use std::sync::Arc;
use tokio::sync::watch;
use twinlight_core::{CommandParser, WAITING};

/// Handle to the value the device currently holds.
///
/// Clones share state. The command path is the only writer; the reporter
/// and panel read through [`DeviceAgent::current`] or a
/// [`DeviceAgent::subscribe`] receiver and always observe a complete value.
#[derive(Debug, Clone)]
pub struct DeviceAgent {
    parser: Arc<CommandParser>,
    current: Arc<watch::Sender<String>>,
}

impl DeviceAgent {
    /// Create an agent holding [`WAITING`].
    #[must_use]
    pub fn new(parser: CommandParser) -> Self {
        let (current, _) = watch::channel(WAITING.to_string());
        Self {
            parser: Arc::new(parser),
            current: Arc::new(current),
        }
    }

    /// Property this agent tracks.
    #[must_use]
    pub fn property(&self) -> &str {
        self.parser.property()
    }

    /// Value currently held.
    #[must_use]
    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    /// Watch for changes of the held value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    /// Replace the held value.
    pub fn apply(&self, value: impl Into<String>) {
        let value = value.into();
        let previous = self.current.send_replace(value.clone());
        if previous != value {
            tracing::info!(from = %previous, to = %value, "Applied desired value");
        }
    }

    /// Parse a raw command payload and apply the value it carries.
    ///
    /// Payloads without a recognizable value leave the state unchanged.
    pub fn handle_command(&self, payload: &[u8]) -> Option<String> {
        let Some(value) = self.parser.parse(payload) else {
            tracing::debug!(payload_len = payload.len(), "Dropped command without value");
            return None;
        };
        self.apply(value.clone());
        Some(value)
    }
}
