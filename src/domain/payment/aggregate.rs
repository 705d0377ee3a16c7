use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::PaymentState;

/// One attempt to charge for an order. Totals are a snapshot taken when the
/// payment was requested; later item changes do not affect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub order_id: Uuid,
    pub payment_id: String,

    pub total_items: i32,
    pub amount: f64,
    pub state: PaymentState,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        order_id: Uuid,
        payment_id: impl Into<String>,
        total_items: i32,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            payment_id: payment_id.into(),
            total_items,
            amount,
            state: PaymentState::WaitingForApproval,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_on_going(&self) -> bool {
        self.state.is_on_going()
    }

    pub fn update_state(&mut self, to: PaymentState, now: DateTime<Utc>) {
        self.state = to;
        self.updated_at = now;
    }
}
