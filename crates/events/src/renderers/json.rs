//! JSON renderer for reporter events.
//!
//! Writes one JSON object per line for machine consumption.

use crate::event::{EventKind, ReportEvent};
use crate::reporter::Reporter;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// JSON-lines renderer.
#[derive(Debug)]
pub struct JsonRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonRenderer<io::Stdout> {
    /// Renderer writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonRenderer<W> {
    /// Create a renderer over `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Consume the renderer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render a single event as one JSON line.
    pub fn render(&self, event: &ReportEvent) {
        let Ok(json) = serde_json::to_string(event) else {
            return;
        };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(out, "{json}").and_then(|()| out.flush());
    }
}

impl<W: Write + Send> Reporter for JsonRenderer<W> {
    fn topic(&self, message: &str) {
        self.render(&ReportEvent::now(EventKind::Topic {
            message: message.to_string(),
        }));
    }

    fn detail(&self, message: &str) {
        self.render(&ReportEvent::now(EventKind::Detail {
            message: message.to_string(),
        }));
    }

    fn warn(&self, message: &str) {
        self.render(&ReportEvent::now(EventKind::Warning {
            message: message.to_string(),
        }));
    }

    fn fatal(&self, message: &str) {
        self.render(&ReportEvent::now(EventKind::Fatal {
            message: message.to_string(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_event_is_one_json_line() {
        let renderer = JsonRenderer::new(Vec::new());
        renderer.topic("Installing ruby");
        renderer.warn("defaulted");
        renderer.fatal("failed\nbadly");

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);

        let fatal: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(fatal["type"], "fatal");
        assert_eq!(fatal["message"], "failed\nbadly");
    }
}
