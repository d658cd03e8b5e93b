//! The reporting seam between the pipeline and whatever renders its output.

use crate::event::{EventKind, ReportEvent};
use std::sync::{Mutex, PoisonError};

/// Receives progress and error signals from the bootstrap pipeline.
///
/// Implementations decide how (and when) to render. In particular a
/// renderer may hold warnings back and show them at [`Reporter::finish`].
pub trait Reporter: Send + Sync {
    /// Begin a major step.
    fn topic(&self, message: &str);

    /// Informational line for the current step.
    fn detail(&self, message: &str) {
        let _ = message;
    }

    /// Report a non-fatal problem.
    fn warn(&self, message: &str);

    /// Report the failure that ends the run.
    ///
    /// Reporters must not terminate the process; that is the caller's job.
    fn fatal(&self, message: &str);

    /// Flush anything held back, such as deferred warnings.
    fn finish(&self) {}
}

/// Reporter that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn topic(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn fatal(&self, _message: &str) {}
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of recorded topics.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.messages(|kind| matches!(kind, EventKind::Topic { .. }))
    }

    /// Messages of recorded warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.messages(|kind| matches!(kind, EventKind::Warning { .. }))
    }

    /// Messages of recorded fatal errors.
    #[must_use]
    pub fn fatals(&self) -> Vec<String> {
        self.messages(|kind| matches!(kind, EventKind::Fatal { .. }))
    }

    fn messages(&self, filter: impl Fn(&EventKind) -> bool) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| filter(&event.kind))
            .map(|event| event.message().to_string())
            .collect()
    }

    fn push(&self, kind: EventKind) {
        tracing::trace!(target: "rubyboot::events", ?kind, "Recorded event");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ReportEvent::now(kind));
    }
}

impl Reporter for RecordingReporter {
    fn topic(&self, message: &str) {
        self.push(EventKind::Topic {
            message: message.to_string(),
        });
    }

    fn detail(&self, message: &str) {
        self.push(EventKind::Detail {
            message: message.to_string(),
        });
    }

    fn warn(&self, message: &str) {
        self.push(EventKind::Warning {
            message: message.to_string(),
        });
    }

    fn fatal(&self, message: &str) {
        self.push(EventKind::Fatal {
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_keeps_order() {
        let reporter = RecordingReporter::new();
        reporter.topic("step one");
        reporter.detail("working");
        reporter.warn("careful");
        reporter.topic("step two");
        reporter.fatal("boom");

        let kinds: Vec<_> = reporter
            .events()
            .into_iter()
            .map(|event| event.kind)
            .collect();
        assert_eq!(kinds.len(), 5);
        assert!(matches!(kinds[0], EventKind::Topic { .. }));
        assert!(matches!(kinds[1], EventKind::Detail { .. }));
        assert!(matches!(kinds[4], EventKind::Fatal { .. }));

        assert_eq!(reporter.topics(), vec!["step one", "step two"]);
        assert_eq!(reporter.warnings(), vec!["careful"]);
        assert_eq!(reporter.fatals(), vec!["boom"]);
    }

    #[test]
    fn test_null_reporter_accepts_everything() {
        let reporter = NullReporter;
        reporter.topic("a");
        reporter.detail("b");
        reporter.warn("c");
        reporter.fatal("d");
        reporter.finish();
    }

    #[test]
    fn test_reporter_is_object_safe() {
        let reporter: Box<dyn Reporter> = Box::new(RecordingReporter::new());
        reporter.topic("dyn dispatch");
    }
}
