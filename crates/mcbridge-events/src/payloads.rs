//! Event payload types carried across the bridge.

use chrono::{DateTime, Utc};

/// Identifier assigned to each event emitted by the bridge.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed domain events surfaced across the system.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The task monitor entered its poll loop.
    MonitorStarted {
        /// Transfer endpoint the monitor watches.
        endpoint_id: String,
    },
    /// The task monitor observed cancellation and left its poll loop.
    MonitorStopped {
        /// Transfer endpoint the monitor watched.
        endpoint_id: String,
    },
    /// Every file under a staging scope finished uploading.
    UploadReady {
        /// Routing identifier recovered from the staging path.
        routing_id: String,
    },
    /// A poll cycle was abandoned because the task query failed.
    CycleFailed {
        /// Rendered failure detail.
        message: String,
    },
    /// Set of degraded components changed.
    HealthChanged {
        /// Components currently reporting degraded health.
        degraded: Vec<String>,
    },
}

impl Event {
    /// Machine-friendly discriminator for consumers and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MonitorStarted { .. } => "monitor_started",
            Self::MonitorStopped { .. } => "monitor_stopped",
            Self::UploadReady { .. } => "upload_ready",
            Self::CycleFailed { .. } => "cycle_failed",
            Self::HealthChanged { .. } => "health_changed",
        }
    }
}

/// Metadata wrapper around events.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialise_with_type_tag() {
        let value = serde_json::to_value(Event::UploadReady {
            routing_id: "12".into(),
        })
        .expect("serialise event");
        assert_eq!(value["type"], "upload_ready");
        assert_eq!(value["routing_id"], "12");
    }

    #[test]
    fn kind_matches_serde_tag() {
        let event = Event::HealthChanged {
            degraded: vec!["task_monitor".into()],
        };
        let value = serde_json::to_value(&event).expect("serialise event");
        assert_eq!(value["type"], event.kind());
    }
}
