use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::metrics::Metrics;
use crate::reconciliation::{NotificationHandler, Outcome, ReconcileError};
use super::envelope::decode_notification;
use super::queue::{NotificationQueue, QueueError, QueueMessage};

// ============================================================================
// Notification Consumer - queue ingestion loop
// ============================================================================
//
// For every message of a batch, in order:
//
//   decode envelope → decode notification → handle → acknowledge
//
// A message is acknowledged whatever happens to it. Undecodable messages are
// dropped, and business errors are only logged: redelivery would produce the
// same error again.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub max_messages: usize,
    pub wait: Duration,
    /// Pause after a failed poll before trying again
    pub poll_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait: Duration::from_secs(20),
            poll_backoff: Duration::from_secs(5),
        }
    }
}

/// Counts for one polled batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub received: usize,
    pub reconciled: usize,
    pub failed: usize,
    pub dropped: usize,
    pub ack_failures: usize,
}

pub struct NotificationConsumer {
    queue: Arc<dyn NotificationQueue>,
    handler: Arc<dyn NotificationHandler>,
    config: ConsumerConfig,
    metrics: Option<Arc<Metrics>>,
}

impl NotificationConsumer {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        handler: Arc<dyn NotificationHandler>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Polls once and processes everything received.
    pub async fn consume_batch(&self) -> Result<BatchReport, QueueError> {
        let messages = self.poll().await?;
        Ok(self.process_batch(&messages).await)
    }

    async fn poll(&self) -> Result<Vec<QueueMessage>, QueueError> {
        self.queue
            .receive(self.config.max_messages, self.config.wait)
            .await
    }

    async fn process_batch(&self, messages: &[QueueMessage]) -> BatchReport {
        let mut report = BatchReport {
            received: messages.len(),
            ..BatchReport::default()
        };

        if let Some(metrics) = &self.metrics {
            metrics.messages_received.inc_by(messages.len() as u64);
        }

        for message in messages {
            self.process(message, &mut report).await;

            if let Err(e) = self.queue.acknowledge(message).await {
                report.ack_failures += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.ack_failures.inc();
                }
                tracing::error!(
                    queue = %self.queue.name(),
                    message_id = %message.message_id,
                    error = %e,
                    "Failed to acknowledge message"
                );
            }
        }

        if report.received > 0 {
            tracing::debug!(
                queue = %self.queue.name(),
                received = report.received,
                reconciled = report.reconciled,
                failed = report.failed,
                dropped = report.dropped,
                ack_failures = report.ack_failures,
                "Batch processed"
            );
        }

        report
    }

    async fn process(&self, message: &QueueMessage, report: &mut BatchReport) {
        let notification = match decode_notification(&message.body) {
            Ok(notification) => notification,
            Err(e) => {
                report.dropped += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.record_dropped(e.reason());
                }
                tracing::warn!(
                    message_id = %message.message_id,
                    reason = e.reason(),
                    error = %e,
                    "Dropping undecodable message"
                );
                return;
            }
        };

        let (kind, payment_id) = match notification.outcome() {
            Ok((_, Outcome::Payment { payment_id, .. })) => ("payment", Some(payment_id.to_string())),
            Ok((_, Outcome::Order { .. })) => ("order", None),
            Err(_) => ("invalid", None),
        };

        let started = Instant::now();
        let result = self.handler.handle(&notification).await;
        let elapsed = started.elapsed().as_secs_f64();

        let outcome = match &result {
            Ok(()) => "ok",
            Err(e) => e.kind(),
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_reconcile(kind, outcome, elapsed);
        }

        match result {
            Ok(()) => {
                report.reconciled += 1;
                tracing::debug!(
                    message_id = %message.message_id,
                    order_id = %notification.order_id,
                    kind,
                    "Notification reconciled"
                );
            }
            Err(e) => {
                report.failed += 1;
                log_reconcile_error(&message.message_id, &notification.order_id, payment_id.as_deref(), &e);
            }
        }
    }

    /// Consumes until `shutdown` flips to true. A batch that already started
    /// is always finished.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            queue = %self.queue.name(),
            max_messages = self.config.max_messages,
            wait_secs = self.config.wait.as_secs(),
            "📥 Notification consumer started"
        );

        while !*shutdown.borrow() {
            // Only the poll is interrupted by shutdown, never the processing.
            let polled = tokio::select! {
                _ = shutdown.changed() => break,
                polled = self.poll() => polled,
            };

            match polled {
                Ok(messages) => {
                    self.process_batch(&messages).await;
                }
                Err(e) => {
                    tracing::error!(
                        queue = %self.queue.name(),
                        error = %e,
                        backoff_secs = self.config.poll_backoff.as_secs(),
                        "Failed to poll queue"
                    );

                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(self.config.poll_backoff) => {}
                    }
                }
            }
        }

        tracing::info!(queue = %self.queue.name(), "Notification consumer stopped");
    }
}

fn log_reconcile_error(
    message_id: &str,
    order_id: &str,
    payment_id: Option<&str>,
    error: &ReconcileError,
) {
    match error {
        ReconcileError::Store(crate::store::StoreError::Database(_)) => tracing::error!(
            message_id,
            order_id,
            payment_id,
            kind = error.kind(),
            error = %error,
            "Reconciliation failed on storage"
        ),
        _ => tracing::warn!(
            message_id,
            order_id,
            payment_id,
            kind = error.kind(),
            error = %error,
            "Notification rejected"
        ),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
