use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::OrderState;
use crate::domain::payment::PaymentState;
use super::errors::ReconcileError;

// ============================================================================
// Reconciliation Notification - decoded from the queue payload
// ============================================================================
//
// Wire shape:
//   { "order_id": "...",
//     "payment": { "id": "...", "state": "Rejected" },   // optional
//     "order":   { "state": "Received" } }              // optional
//
// Exactly one of `payment` / `order` must be present.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub order_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub id: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub state: String,
}

/// The single change a valid notification asks for, with its state already
/// mapped onto the domain enum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    Order {
        requested: OrderState,
    },
    Payment {
        payment_id: &'a str,
        requested: PaymentState,
    },
}

impl Notification {
    pub fn for_order(order_id: Uuid, state: impl Into<String>) -> Self {
        Self {
            order_id: order_id.to_string(),
            payment: None,
            order: Some(OrderOutcome { state: state.into() }),
        }
    }

    pub fn for_payment(order_id: Uuid, payment_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            order_id: order_id.to_string(),
            payment: Some(PaymentOutcome {
                id: payment_id.into(),
                state: state.into(),
            }),
            order: None,
        }
    }

    /// Checks the shape of the notification and resolves the requested change.
    pub fn outcome(&self) -> Result<(Uuid, Outcome<'_>), ReconcileError> {
        let order_id = Uuid::parse_str(self.order_id.trim())
            .map_err(|_| ReconcileError::MessageNotValid("order_id is not a valid UUID"))?;

        let outcome = match (&self.order, &self.payment) {
            (None, None) => {
                return Err(ReconcileError::MessageNotValid(
                    "carries neither an order nor a payment outcome",
                ))
            }
            (Some(_), Some(_)) => {
                return Err(ReconcileError::MessageNotValid(
                    "carries both an order and a payment outcome",
                ))
            }
            (Some(order), None) => Outcome::Order {
                requested: OrderState::from_wire(&order.state),
            },
            (None, Some(payment)) => {
                if payment.id.trim().is_empty() {
                    return Err(ReconcileError::MessageNotValid("payment id is empty"));
                }
                Outcome::Payment {
                    payment_id: payment.id.trim(),
                    requested: PaymentState::from_wire(&payment.state),
                }
            }
        };

        Ok((order_id, outcome))
    }
}
