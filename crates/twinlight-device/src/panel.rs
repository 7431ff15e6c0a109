//! Local presentation of the device's current value.

use std::io::Write;

const CLEAR: &str = "\x1b[2J\x1b[H";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[90m";

/// One lamp of the traffic light.
struct Lamp {
    /// Substring of the upper-cased value that lights this lamp
    color: &'static str,
    label: &'static str,
    ansi: &'static str,
}

const LAMPS: [Lamp; 3] = [
    Lamp {
        color: "RED",
        label: "ĐỎ",
        ansi: "\x1b[91m",
    },
    Lamp {
        color: "YELLOW",
        label: "VÀNG",
        ansi: "\x1b[93m",
    },
    Lamp {
        color: "GREEN",
        label: "XANH",
        ansi: "\x1b[92m",
    },
];

/// Something that can show the device's value.
pub trait LightPanel: Send + Sync {
    /// Draw `value`.
    fn show(&self, value: &str);
}

impl<T: LightPanel + ?Sized> LightPanel for Box<T> {
    fn show(&self, value: &str) {
        (**self).show(value);
    }
}

/// Full-screen ANSI traffic light on stdout.
#[derive(Debug, Clone)]
pub struct TerminalPanel {
    device_id: String,
}

impl TerminalPanel {
    /// Create a panel titled with `device_id`.
    #[must_use]
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }

    /// Render one frame, including the clear-screen prefix.
    #[must_use]
    pub fn render_frame(&self, value: &str) -> String {
        let upper = value.to_uppercase();
        let mut frame = String::from(CLEAR);

        frame.push_str("+-------------------------------+\n");
        frame.push_str("|    KUBEEDGE TRAFFIC LIGHT     |\n");
        frame.push_str(&format!("|    {:<27}|\n", self.device_id));
        frame.push_str("+-------------------------------+\n");

        for lamp in &LAMPS {
            let line = if upper.contains(lamp.color) {
                format!("{}  ●  {}{RESET}", lamp.ansi, lamp.label)
            } else {
                format!("{DIM}  ○  {}{RESET}", lamp.label)
            };
            frame.push_str(&line);
            frame.push('\n');
        }

        frame.push_str("+-------------------------------+\n");
        frame.push_str(&format!(" TRẠNG THÁI: {value}\n"));
        frame
    }
}

impl LightPanel for TerminalPanel {
    fn show(&self, value: &str) {
        let frame = self.render_frame(value);
        let mut out = std::io::stdout().lock();
        if let Err(err) = out.write_all(frame.as_bytes()).and_then(|()| out.flush()) {
            tracing::debug!(error = %err, "Failed to draw terminal panel");
        }
    }
}

/// Headless panel that logs the value.
#[derive(Debug, Clone, Default)]
pub struct LogPanel;

impl LightPanel for LogPanel {
    fn show(&self, value: &str) {
        tracing::info!(value, "Light state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(frame: &str, label: &str) -> bool {
        frame
            .lines()
            .any(|line| line.contains('●') && line.contains(label))
    }

    #[test]
    fn lights_matching_lamp() {
        let frame = TerminalPanel::new("light-01").render_frame("RED");
        assert!(frame.starts_with(CLEAR));
        assert!(lit(&frame, "ĐỎ"));
        assert!(!lit(&frame, "VÀNG"));
        assert!(!lit(&frame, "XANH"));
        assert!(frame.contains(" TRẠNG THÁI: RED"));
        assert!(frame.contains("light-01"));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let frame = TerminalPanel::new("light-01").render_frame("blinking green");
        assert!(lit(&frame, "XANH"));
        assert!(!lit(&frame, "ĐỎ"));
    }

    #[test]
    fn waiting_lights_nothing() {
        let frame = TerminalPanel::new("light-01").render_frame("WAITING");
        assert!(!frame.contains('●'));
        assert!(frame.contains(" TRẠNG THÁI: WAITING"));
    }

    #[test]
    fn boxed_panels_delegate() {
        let panel: Box<dyn LightPanel> = Box::new(LogPanel);
        panel.show("GREEN");
    }
}
