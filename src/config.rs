use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::messaging::ConsumerConfig;

const DEFAULT_KAFKA_BROKERS: &str = "127.0.0.1:9092";
const DEFAULT_KAFKA_GROUP_ID: &str = "order-reconciler";
const DEFAULT_UPDATE_ORDER_QUEUE: &str = "UpdateOrderQueue";
const DEFAULT_ORDER_PAYMENT_TOPIC: &str = "OrderPaymentTopic";
const DEFAULT_QUEUE_MAX_MESSAGES: usize = 10;
const DEFAULT_QUEUE_WAIT_SECONDS: u64 = 20;
const DEFAULT_QUEUE_POLL_BACKOFF_SECONDS: u64 = 5;
const DEFAULT_METRICS_PORT: u16 = 9090;
const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub kafka_brokers: String,
    pub kafka_group_id: String,
    pub update_order_queue: String,
    pub order_payment_topic: String,
    pub queue_max_messages: usize,
    pub queue_wait: Duration,
    pub queue_poll_backoff: Duration,
    pub metrics_port: u16,
    pub api_port: u16,
}

impl AppConfig {
    /// Reads the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let string_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let queue_max_messages =
            parse_or(&lookup, "QUEUE_MAX_MESSAGES", DEFAULT_QUEUE_MAX_MESSAGES)?;
        if queue_max_messages == 0 {
            return Err(ConfigError::Invalid {
                key: "QUEUE_MAX_MESSAGES",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            kafka_brokers: string_or("KAFKA_BROKERS", DEFAULT_KAFKA_BROKERS),
            kafka_group_id: string_or("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID),
            update_order_queue: string_or("UPDATE_ORDER_QUEUE_NAME", DEFAULT_UPDATE_ORDER_QUEUE),
            order_payment_topic: string_or("ORDER_PAYMENT_TOPIC_NAME", DEFAULT_ORDER_PAYMENT_TOPIC),
            queue_max_messages,
            queue_wait: Duration::from_secs(parse_or(
                &lookup,
                "QUEUE_WAIT_SECONDS",
                DEFAULT_QUEUE_WAIT_SECONDS,
            )?),
            queue_poll_backoff: Duration::from_secs(parse_or(
                &lookup,
                "QUEUE_POLL_BACKOFF_SECONDS",
                DEFAULT_QUEUE_POLL_BACKOFF_SECONDS,
            )?),
            metrics_port: parse_or(&lookup, "METRICS_PORT", DEFAULT_METRICS_PORT)?,
            api_port: parse_or(&lookup, "API_PORT", DEFAULT_API_PORT)?,
        })
    }

    pub fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            max_messages: self.queue_max_messages,
            wait: self.queue_wait,
            poll_backoff: self.queue_poll_backoff,
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/orders")]).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/orders");
        assert_eq!(config.kafka_brokers, "127.0.0.1:9092");
        assert_eq!(config.update_order_queue, "UpdateOrderQueue");
        assert_eq!(config.order_payment_topic, "OrderPaymentTopic");
        assert_eq!(config.queue_max_messages, 10);
        assert_eq!(config.queue_wait, Duration::from_secs(20));
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.database_max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/orders"),
            ("KAFKA_BROKERS", "redpanda:9092"),
            ("UPDATE_ORDER_QUEUE_NAME", "orders.updates"),
            ("QUEUE_MAX_MESSAGES", "25"),
            ("QUEUE_WAIT_SECONDS", " 3 "),
            ("METRICS_PORT", "9100"),
            ("API_PORT", "8000"),
            ("ORDER_PAYMENT_TOPIC_NAME", "orders.payments"),
        ])
        .unwrap();

        assert_eq!(config.kafka_brokers, "redpanda:9092");
        assert_eq!(config.update_order_queue, "orders.updates");
        assert_eq!(config.queue_max_messages, 25);
        assert_eq!(config.queue_wait, Duration::from_secs(3));
        assert_eq!(config.metrics_port, 9100);
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.order_payment_topic, "orders.payments");

        let consumer = config.consumer_config();
        assert_eq!(consumer.max_messages, 25);
        assert_eq!(consumer.wait, Duration::from_secs(3));
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(matches!(config_from(&[]), Err(ConfigError::Missing("DATABASE_URL"))));
        assert!(matches!(
            config_from(&[("DATABASE_URL", "  ")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let result = config_from(&[("DATABASE_URL", "postgres://db"), ("METRICS_PORT", "http")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "METRICS_PORT", .. })));

        let result = config_from(&[("DATABASE_URL", "postgres://db"), ("QUEUE_MAX_MESSAGES", "0")]);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "QUEUE_MAX_MESSAGES", .. })));
    }
}
