use super::value_objects::OrderState;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Order item already exists: {0}")]
    ItemAlreadyExists(String),

    #[error("Invalid order item {id}: price and quantity must be greater than zero")]
    InvalidItem { id: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: OrderState, to: OrderState },

    #[error("Order is already completed or cancelled")]
    AlreadyCompleted,

    #[error("Items can only be added while the order is in state Created (current: {0})")]
    CannotAddItems(OrderState),

    #[error("Order has no items")]
    HasNoItems,

    #[error("Order has on-going payments")]
    HasOnGoingPayments,
}
