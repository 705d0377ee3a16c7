use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderError, OrderState};
use crate::domain::payment::PaymentState;
use crate::metrics::Metrics;
use crate::store::{OrderStore, PaymentStore};
use crate::utils::Clock;
use super::errors::ReconcileError;
use super::notification::{Notification, Outcome};

// ============================================================================
// Reconciliation Service
// ============================================================================
//
// Applies one externally reported change to the persisted order or payment:
//
//   notification → validate → load order → check transition → persist
//                                                   ↓ (payment outcomes)
//                                      reload order → cascade cancellation
//
// Every write re-applies a target state, so handling the same notification
// twice leaves the stores exactly as handling it once.
//
// ============================================================================

/// Anything able to act on a decoded notification. The queue consumer only
/// depends on this seam.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn handle(&self, notification: &Notification) -> Result<(), ReconcileError>;
}

pub struct ReconciliationService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<Metrics>>,
}

impl ReconciliationService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            payments,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn apply_order_state(
        &self,
        mut order: Order,
        requested: OrderState,
    ) -> Result<(), ReconcileError> {
        if order.state == requested {
            tracing::debug!(
                order_id = %order.id,
                state = %requested,
                "Order already in requested state, nothing to do"
            );
            return Ok(());
        }

        if !order.state.can_transition_to(requested) {
            return Err(OrderError::InvalidStateTransition {
                from: order.state,
                to: requested,
            }
            .into());
        }

        let from = order.state;
        order.update_state(requested, self.clock.now())?;
        self.orders.update(&order, false).await?;

        tracing::info!(
            order_id = %order.id,
            from = %from,
            to = %requested,
            "Order state reconciled"
        );

        Ok(())
    }

    async fn apply_payment_state(
        &self,
        mut order: Order,
        payment_id: &str,
        requested: PaymentState,
    ) -> Result<(), ReconcileError> {
        let now = self.clock.now();
        let order_id = order.id;

        let payment = order
            .payment_by_id_mut(payment_id)
            .ok_or_else(|| ReconcileError::PaymentNotFound {
                order_id,
                payment_id: payment_id.to_string(),
            })?;

        if payment.state == requested {
            tracing::debug!(
                order_id = %order_id,
                payment_id = %payment_id,
                state = %requested,
                "Payment already in requested state"
            );
        } else {
            if !payment.state.can_transition_to(requested) {
                return Err(ReconcileError::InvalidPaymentTransition {
                    payment_id: payment_id.to_string(),
                    from: payment.state,
                    to: requested,
                });
            }

            let from = payment.state;
            payment.update_state(requested, now);
            self.payments.update(payment).await?;

            tracing::info!(
                order_id = %order_id,
                payment_id = %payment_id,
                from = %from,
                to = %requested,
                "Payment state reconciled"
            );
        }

        // Evaluated even when the payment write was a no-op, so a redelivered
        // rejection completes a cascade that failed on the first attempt.
        self.cascade_cancellation(order_id).await
    }

    /// Cancels the order once every one of its payments has been rejected.
    async fn cascade_cancellation(&self, order_id: Uuid) -> Result<(), ReconcileError> {
        // The snapshot loaded before the payment write is stale.
        let mut order = self.orders.get_by_id(order_id).await?;

        if !order.should_cancel() || order.state == OrderState::Cancelled {
            return Ok(());
        }

        let from = order.state;
        order.update_state(OrderState::Cancelled, self.clock.now())?;
        self.orders.update(&order, false).await?;

        if let Some(metrics) = &self.metrics {
            metrics.cascade_cancellations.inc();
        }

        tracing::warn!(
            order_id = %order_id,
            from = %from,
            rejected_payments = order.payments.len(),
            "Order cancelled: every payment was rejected"
        );

        Ok(())
    }
}

#[async_trait]
impl NotificationHandler for ReconciliationService {
    #[tracing::instrument(skip(self, notification), fields(order_id = %notification.order_id))]
    async fn handle(&self, notification: &Notification) -> Result<(), ReconcileError> {
        let (order_id, outcome) = notification.outcome()?;

        let order = self.orders.get_by_id(order_id).await?;

        match outcome {
            Outcome::Order { requested } => self.apply_order_state(order, requested).await,
            Outcome::Payment {
                payment_id,
                requested,
            } => self.apply_payment_state(order, payment_id, requested).await,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
