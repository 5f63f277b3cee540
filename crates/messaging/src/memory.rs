use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::producer::{EventPublisher, PublisherError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

/// Publisher that records messages instead of sending them
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    published: Mutex<Vec<PublishedMessage>>,
    failing: AtomicBool,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), PublisherError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublisherError::PublishFailed("broker unreachable".to_string()));
        }

        self.published.lock().await.push(PublishedMessage {
            topic: topic.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
