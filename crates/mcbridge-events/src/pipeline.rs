//! Upload hand-off delivered over the event bus.

use async_trait::async_trait;
use mcbridge_transfer_core::{TransferResult, UploadPipeline};
use tracing::debug;

use crate::payloads::Event;
use crate::routing::EventBus;

/// [`UploadPipeline`] that publishes [`Event::UploadReady`] for ingestion
/// workers to consume.
///
/// Publishing is non-blocking, so the hand-off never waits on the consumer.
/// Consumers own idempotence for repeated routing ids.
#[derive(Clone)]
pub struct EventPipeline {
    events: EventBus,
}

impl EventPipeline {
    /// Publish hand-offs onto `events`.
    #[must_use]
    pub const fn new(events: EventBus) -> Self {
        Self { events }
    }
}

#[async_trait]
impl UploadPipeline for EventPipeline {
    async fn on_upload_ready(&self, routing_id: &str) -> TransferResult<()> {
        let event_id = self.events.publish(Event::UploadReady {
            routing_id: routing_id.to_string(),
        });
        debug!(event_id, routing_id, "published upload-ready event");
        Ok(())
    }
}
