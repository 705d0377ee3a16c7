pub mod consumer;
pub mod envelope;
pub mod kafka_queue;
pub mod queue;
pub mod redpanda;

pub use consumer::{BatchReport, ConsumerConfig, NotificationConsumer};
pub use envelope::{decode_notification, MessageError, TopicEnvelope, EXPECTED_TYPE};
pub use kafka_queue::KafkaQueue;
pub use queue::{NotificationQueue, QueueError, QueueMessage};
pub use redpanda::{PublishError, RedpandaPublisher, TopicPublisher};
