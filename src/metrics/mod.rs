mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the reconciler
// ============================================================================
//
// - Queue intake (received, dropped by reason, ack failures)
// - Reconciliation outcomes and latency
// - Cancellation cascades
// - Payment requests published
//
// Scraped via /metrics on the metrics server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Queue Intake
    pub messages_received: IntCounter,
    pub messages_dropped: IntCounterVec,
    pub ack_failures: IntCounter,

    // Reconciliation
    pub notifications_reconciled: IntCounterVec,
    pub reconcile_duration: HistogramVec,
    pub cascade_cancellations: IntCounter,

    // Payment Initiation
    pub payments_published: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let messages_received = IntCounter::new(
            "queue_messages_received_total",
            "Total messages received from the update queue",
        )?;
        registry.register(Box::new(messages_received.clone()))?;

        let messages_dropped = IntCounterVec::new(
            Opts::new(
                "queue_messages_dropped_total",
                "Messages acknowledged without reaching reconciliation",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(messages_dropped.clone()))?;

        let ack_failures = IntCounter::new(
            "queue_ack_failures_total",
            "Acknowledgements that failed and will be redelivered",
        )?;
        registry.register(Box::new(ack_failures.clone()))?;

        let notifications_reconciled = IntCounterVec::new(
            Opts::new(
                "notifications_reconciled_total",
                "Notifications handled, by kind and outcome",
            ),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(notifications_reconciled.clone()))?;

        let reconcile_duration = HistogramVec::new(
            HistogramOpts::new(
                "reconcile_duration_seconds",
                "Time spent handling one notification",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["kind"],
        )?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        let cascade_cancellations = IntCounter::new(
            "order_cascade_cancellations_total",
            "Orders cancelled because every payment was rejected",
        )?;
        registry.register(Box::new(cascade_cancellations.clone()))?;

        let payments_published = IntCounterVec::new(
            Opts::new("payments_published_total", "Payment requests sent to the payment topic"),
            &["result"],
        )?;
        registry.register(Box::new(payments_published.clone()))?;

        Ok(Self {
            registry,
            messages_received,
            messages_dropped,
            ack_failures,
            notifications_reconciled,
            reconcile_duration,
            cascade_cancellations,
            payments_published,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Records one handled notification. `kind` is `order` or `payment`,
    /// `outcome` is `ok` or an error kind label.
    pub fn record_reconcile(&self, kind: &str, outcome: &str, duration_secs: f64) {
        self.notifications_reconciled
            .with_label_values(&[kind, outcome])
            .inc();
        self.reconcile_duration
            .with_label_values(&[kind])
            .observe(duration_secs);
    }

    pub fn record_dropped(&self, reason: &str) {
        self.messages_dropped.with_label_values(&[reason]).inc();
    }

    pub fn record_payment_published(&self, success: bool) {
        let result = if success { "ok" } else { "error" };
        self.payments_published.with_label_values(&[result]).inc();
    }
}
