use uuid::Uuid;

use crate::domain::order::OrderError;
use crate::domain::payment::PaymentState;
use crate::store::StoreError;

// ============================================================================
// Reconciliation Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Message not valid: {0}")]
    MessageNotValid(&'static str),

    #[error("Payment {payment_id} not found on order {order_id}")]
    PaymentNotFound { order_id: Uuid, payment_id: String },

    #[error("Invalid payment state transition for {payment_id}: {from} -> {to}")]
    InvalidPaymentTransition {
        payment_id: String,
        from: PaymentState,
        to: PaymentState,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReconcileError {
    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileError::MessageNotValid(_) => "message_not_valid",
            ReconcileError::PaymentNotFound { .. } => "payment_not_found",
            ReconcileError::InvalidPaymentTransition { .. } => "invalid_payment_transition",
            ReconcileError::Order(OrderError::InvalidStateTransition { .. }) => "invalid_state_transition",
            ReconcileError::Order(_) => "order_rule",
            ReconcileError::Store(StoreError::OrderNotFound(_)) => "order_not_found",
            ReconcileError::Store(StoreError::PaymentNotFound(_)) => "payment_not_found",
            ReconcileError::Store(_) => "storage",
        }
    }
}
