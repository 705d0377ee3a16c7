use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{Order, OrderError};
use crate::domain::payment::Payment;
use crate::messaging::{PublishError, TopicPublisher};
use crate::metrics::Metrics;
use crate::store::{OrderStore, PaymentStore};
use crate::utils::Clock;
use super::errors::ServiceError;

// ============================================================================
// Payment Initiation
// ============================================================================
//
// Publishes a pay request for an order to the payment topic, then records
// the payment as waiting for approval. The gateway later answers through the
// update queue, keyed by the same payment id.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRequestItem {
    pub id: String,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRequest {
    pub order_id: Uuid,
    pub payment_id: String,
    pub items: Vec<PayRequestItem>,
    pub total_items: i32,
    pub amount: f64,
}

impl PayRequest {
    fn for_order(order: &Order, payment_id: &str) -> Self {
        Self {
            order_id: order.id,
            payment_id: payment_id.to_string(),
            items: order
                .items
                .iter()
                .map(|item| PayRequestItem {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            total_items: order.total_items,
            amount: order.total_price,
        }
    }
}

pub struct PaymentInitiationService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    publisher: Arc<dyn TopicPublisher>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<Metrics>>,
}

impl PaymentInitiationService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        publisher: Arc<dyn TopicPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            payments,
            publisher,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Requests a payment for the order. With `resend`, a new request is sent
    /// even while an earlier one is still on-going.
    #[tracing::instrument(skip(self))]
    pub async fn send_to_pay(&self, order_id: Uuid, resend: bool) -> Result<Payment, ServiceError> {
        let mut order = self.orders.get_by_id(order_id).await?;

        if !order.has_items() {
            return Err(OrderError::HasNoItems.into());
        }
        if !resend && order.has_on_going_payments() {
            return Err(OrderError::HasOnGoingPayments.into());
        }

        order.calculate_totals();

        let payment_id = Uuid::new_v4().to_string();
        let request = PayRequest::for_order(&order, &payment_id);
        let payload = serde_json::to_string(&request).map_err(PublishError::from)?;

        let published = self
            .publisher
            .publish_message(&order.id.to_string(), &payload)
            .await;
        if let Some(metrics) = &self.metrics {
            metrics.record_payment_published(published.is_ok());
        }
        let message_id = published?;

        let payment = Payment::new(
            order.id,
            payment_id,
            order.total_items,
            order.total_price,
            self.clock.now(),
        );
        self.payments.create(&payment).await?;

        tracing::info!(
            order_id = %order.id,
            payment_id = %payment.payment_id,
            message_id = %message_id,
            amount = payment.amount,
            resend,
            "Payment requested"
        );

        Ok(payment)
    }
}
