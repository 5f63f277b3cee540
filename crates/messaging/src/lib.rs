pub mod memory;
pub mod producer;

pub use memory::{InMemoryEventPublisher, PublishedMessage};
pub use producer::{EventPublisher, KafkaEventPublisher, PublisherError};
