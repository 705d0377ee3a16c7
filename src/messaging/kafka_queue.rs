use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    message::Message,
    util::Timeout,
};

use super::queue::{NotificationQueue, QueueError, QueueMessage};

// ============================================================================
// Kafka / Redpanda Update Queue
// ============================================================================
//
// Offsets are stored manually (`enable.auto.offset.store=false`) and only
// after the consumer acknowledges a message, so anything not acknowledged is
// redelivered after a restart or rebalance. Stored offsets are committed by
// the client in the background.
//
// ============================================================================

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KafkaQueue {
    topic: String,
    consumer: StreamConsumer,
    resolved: AtomicBool,
}

impl KafkaQueue {
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, QueueError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .create()?;

        Ok(Self {
            topic: topic.to_string(),
            consumer,
            resolved: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl NotificationQueue for KafkaQueue {
    fn name(&self) -> &str {
        &self.topic
    }

    async fn resolve(&self) -> Result<(), QueueError> {
        let metadata = self
            .consumer
            .fetch_metadata(Some(self.topic.as_str()), Timeout::After(METADATA_TIMEOUT))?;

        let found = metadata
            .topics()
            .iter()
            .any(|t| t.name() == self.topic && t.error().is_none() && !t.partitions().is_empty());

        if !found {
            return Err(QueueError::NotFound(self.topic.clone()));
        }

        self.consumer.subscribe(&[self.topic.as_str()])?;
        self.resolved.store(true, Ordering::SeqCst);

        tracing::info!(topic = %self.topic, "Update queue resolved");
        Ok(())
    }

    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        if !self.resolved.load(Ordering::SeqCst) {
            return Err(QueueError::NotResolved(self.topic.clone()));
        }

        let mut batch = Vec::with_capacity(max_messages);
        let deadline = tokio::time::Instant::now() + wait;
        let mut stream = std::pin::pin!(self.consumer.stream());

        while batch.len() < max_messages {
            // Once something arrived, hand it over instead of waiting out the window.
            let next = if batch.is_empty() {
                tokio::time::timeout_at(deadline, stream.next()).await
            } else {
                tokio::time::timeout(Duration::from_millis(50), stream.next()).await
            };

            let message = match next {
                Ok(Some(Ok(message))) => message,
                Ok(Some(Err(e))) if batch.is_empty() => return Err(e.into()),
                Ok(Some(Err(e))) => {
                    tracing::warn!(topic = %self.topic, error = %e, "Poll error, returning partial batch");
                    break;
                }
                Ok(None) | Err(_) => break,
            };

            batch.push(QueueMessage {
                message_id: format!("{}:{}", message.partition(), message.offset()),
                body: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                partition: message.partition(),
                offset: message.offset(),
            });
        }

        Ok(batch)
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.consumer
            .store_offset(&self.topic, message.partition, message.offset + 1)?;
        Ok(())
    }
}
