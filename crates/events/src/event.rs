//! Event type definitions for reporter output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single reported event with its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEvent {
    /// When the event was reported.
    pub timestamp: DateTime<Utc>,
    /// What was reported.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ReportEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    /// The message carried by the event.
    #[must_use]
    pub fn message(&self) -> &str {
        self.kind.message()
    }
}

/// The kinds of events a [`Reporter`](crate::Reporter) can receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Headline for a major step.
    Topic {
        /// Step description.
        message: String,
    },
    /// Informational line belonging to the current step.
    Detail {
        /// Detail text, possibly multi-line.
        message: String,
    },
    /// Non-fatal problem worth surfacing to the user.
    Warning {
        /// Warning text, possibly multi-line.
        message: String,
    },
    /// Build-fatal failure. Always the last event of a run.
    Fatal {
        /// Diagnostic text, possibly multi-line.
        message: String,
    },
}

impl EventKind {
    /// The message carried by the event.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Topic { message }
            | Self::Detail { message }
            | Self::Warning { message }
            | Self::Fatal { message } => message,
        }
    }
}
