use std::time::Duration;

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    error::{KafkaError, RDKafkaErrorCode},
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};

use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to create producer: {0}")]
    Producer(#[source] KafkaError),

    #[error("Kafka send error on {topic}: {source}")]
    Send {
        topic: String,
        #[source]
        source: KafkaError,
    },

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IsTransient for PublishError {
    fn is_transient(&self) -> bool {
        match self {
            PublishError::Send { source, .. } => match source.rdkafka_error_code() {
                Some(
                    RDKafkaErrorCode::MessageTimedOut
                    | RDKafkaErrorCode::QueueFull
                    | RDKafkaErrorCode::RequestTimedOut
                    | RDKafkaErrorCode::BrokerTransportFailure
                    | RDKafkaErrorCode::AllBrokersDown
                    | RDKafkaErrorCode::NotLeaderForPartition
                    | RDKafkaErrorCode::LeaderNotAvailable
                    | RDKafkaErrorCode::NetworkException,
                ) => true,
                Some(_) => false,
                None => true,
            },
            PublishError::Producer(_) | PublishError::Serialize(_) => false,
        }
    }
}

/// Outbound topic the payment requests are published to.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Publishes `payload` keyed by `key` and returns the broker's message id.
    async fn publish_message(&self, key: &str, payload: &str) -> Result<String, PublishError>;
}

pub struct RedpandaPublisher {
    producer: FutureProducer,
    topic: String,
    retry: RetryConfig,
}

impl RedpandaPublisher {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("enable.idempotence", "true")
            .create()
            .map_err(PublishError::Producer)?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
            retry: RetryConfig::for_publish(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn send_once(&self, key: &str, payload: &str) -> Result<String, PublishError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);

        let delivery = self
            .producer
            .send(record, Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(source, _)| PublishError::Send {
                topic: self.topic.clone(),
                source,
            })?;

        Ok(format!("{}:{}", delivery.partition, delivery.offset))
    }
}

#[async_trait]
impl TopicPublisher for RedpandaPublisher {
    async fn publish_message(&self, key: &str, payload: &str) -> Result<String, PublishError> {
        let message_id = retry_on_transient(&self.retry, "redpanda_publish", |_| {
            self.send_once(key, payload)
        })
        .await?;

        tracing::info!(
            topic = %self.topic,
            key = %key,
            message_id = %message_id,
            "Published to Redpanda"
        );

        Ok(message_id)
    }
}
