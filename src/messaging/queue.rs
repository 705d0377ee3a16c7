use std::time::Duration;

use async_trait::async_trait;

/// A message taken off the update queue. The position is what gets
/// acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub message_id: String,
    pub body: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue not found: {0}")]
    NotFound(String),

    #[error("Queue {0} has not been resolved")]
    NotResolved(String),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// The queue the reconciler consumes from.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    fn name(&self) -> &str;

    /// Looks the queue up by its logical name. Must succeed before `receive`.
    async fn resolve(&self) -> Result<(), QueueError>;

    /// Long-polls for up to `max_messages`, waiting at most `wait`. An empty
    /// batch is a normal result.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), QueueError>;
}
