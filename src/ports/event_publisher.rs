//! EventPublisher port.
//!
//! Called only after a change has been committed. Delivery is best-effort:
//! use cases log a `PublishError` and still report success.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::DomainEvent;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Event delivery failed for {event_type}: {reason}")]
    Delivery {
        event_type: &'static str,
        reason: String,
    },

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError>;

    /// Publish in order, stopping at the first failure
    async fn publish_many(&self, events: &[DomainEvent]) -> Result<(), PublishError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_publisher_is_object_safe() {
        fn _accepts_dyn(_publisher: &dyn EventPublisher) {}
    }
}
