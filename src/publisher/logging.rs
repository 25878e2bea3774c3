//! Publisher that writes every event to the tracing log.

use async_trait::async_trait;
use tracing::info;

use crate::domain::DomainEvent;
use crate::ports::{EventPublisher, PublishError};

#[derive(Debug, Clone, Default)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        info!(
            event_type = event.event_type(),
            aggregate_type = event.aggregate_type(),
            aggregate_id = %event.aggregate_id(),
            payload = %payload,
            "Domain event"
        );
        Ok(())
    }
}
