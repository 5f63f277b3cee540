pub mod order_events;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::OrderId;

/// Envelope wrapping every event published to the broker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub event_type: String,
    pub event_version: i32,
    pub payload: serde_json::Value,
    pub metadata: EventMetadata,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    pub correlation_id: Uuid,
    pub source: String,
}

impl EventMetadata {
    pub fn new(source: &str) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            source: source.to_string(),
        }
    }
}

/// Trait for all domain events
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> {
    /// Get the event type name
    fn event_type() -> &'static str;

    /// Get the event version
    fn event_version() -> i32 {
        1
    }

    /// Convert event to envelope
    fn to_envelope(
        &self,
        order_id: OrderId,
        metadata: EventMetadata,
    ) -> Result<EventEnvelope, serde_json::Error> {
        Ok(EventEnvelope {
            event_id: Uuid::new_v4(),
            order_id,
            event_type: Self::event_type().to_string(),
            event_version: Self::event_version(),
            payload: serde_json::to_value(self)?,
            metadata,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_metadata_new() {
        let first = EventMetadata::new("order-service");
        let second = EventMetadata::new("order-service");
        assert_eq!(first.source, "order-service");
        assert_ne!(first.correlation_id, second.correlation_id);
    }
}
