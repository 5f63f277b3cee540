use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("Failed to create Kafka producer: {0}")]
    ProducerCreation(String),

    #[error("Failed to publish event: {0}")]
    PublishFailed(String),
}

/// Publishes raw event payloads to a broker
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `payload` to `topic`, keyed by `routing_key`
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), PublisherError>;
}

/// Kafka event publisher
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    send_timeout: Duration,
}

impl KafkaEventPublisher {
    /// Create a new publisher
    ///
    /// # Arguments
    /// * `brokers` - Comma-separated list of Kafka brokers (e.g., "localhost:9092")
    ///
    /// # Example
    /// ```no_run
    /// use messaging::KafkaEventPublisher;
    ///
    /// let publisher = KafkaEventPublisher::new("localhost:9092")
    ///     .expect("Failed to create publisher");
    /// ```
    pub fn new(brokers: &str) -> Result<Self, PublisherError> {
        info!("Creating Kafka producer for brokers: {}", brokers);

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("compression.type", "snappy")
            .set("acks", "all") // Wait for all replicas to acknowledge
            .set("retries", "3")
            .create()
            .map_err(|e| PublisherError::ProducerCreation(e.to_string()))?;

        Ok(Self {
            producer,
            send_timeout: Duration::from_secs(5),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), PublisherError> {
        let record = FutureRecord::to(topic).key(routing_key).payload(payload);

        match self
            .producer
            .send(record, Timeout::After(self.send_timeout))
            .await
        {
            Ok((partition, offset)) => {
                info!(
                    topic = %topic,
                    routing_key = %routing_key,
                    partition,
                    offset,
                    "Event published"
                );
                Ok(())
            }
            Err((err, _)) => {
                warn!(topic = %topic, routing_key = %routing_key, "Failed to publish event: {}", err);
                Err(PublisherError::PublishFailed(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_publisher_creation_with_invalid_brokers() {
        // creation does not validate the connection
        let result = KafkaEventPublisher::new("");
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires Kafka to be running
    async fn test_publish_to_local_broker() {
        let publisher = KafkaEventPublisher::new("localhost:9092").unwrap();
        let result = publisher
            .publish("orders", "order.created", br#"{"order_id":1}"#)
            .await;
        assert!(result.is_ok());
    }
}
