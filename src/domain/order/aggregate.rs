use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::Payment;
use super::errors::OrderError;
use super::value_objects::{OrderItem, OrderState, TrackId};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub track_id: TrackId,

    pub customer_id: Uuid,
    pub state: OrderState,
    pub state_updated_at: DateTime<Utc>,

    // Derived from items, see `calculate_totals`
    pub total_items: i32,
    pub total_price: f64,

    pub items: Vec<OrderItem>,

    /// Every payment ever requested for this order, oldest first.
    pub payments: Vec<Payment>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(customer_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            track_id: TrackId::generate(),
            customer_id,
            state: OrderState::Created,
            state_updated_at: now,
            total_items: 0,
            total_price: 0.0,
            items: Vec::new(),
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_item(&mut self, item: OrderItem, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.items.iter().any(|existing| existing.id == item.id) {
            return Err(OrderError::ItemAlreadyExists(item.id));
        }

        if !item.is_valid() {
            return Err(OrderError::InvalidItem { id: item.id });
        }

        self.items.push(item);
        self.updated_at = now;
        self.calculate_totals();

        Ok(())
    }

    /// Recomputes totals from the item lines. Safe to call any number of times.
    ///
    /// The item count saturates at `i32::MAX` so rows loaded from storage
    /// cannot overflow it.
    pub fn calculate_totals(&mut self) {
        self.total_items = self
            .items
            .iter()
            .fold(0i32, |total, item| total.saturating_add(item.quantity));
        self.total_price = self.items.iter().map(OrderItem::subtotal).sum();
    }

    pub fn update_state(&mut self, to: OrderState, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.state == to {
            return Ok(());
        }

        if !self.state.can_transition_to(to) {
            return Err(OrderError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }

        self.state = to;
        self.state_updated_at = now;
        self.updated_at = now;

        Ok(())
    }

    pub fn can_add_items(&self) -> bool {
        self.state == OrderState::Created
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn has_on_going_payments(&self) -> bool {
        self.payments.iter().any(Payment::is_on_going)
    }

    pub fn payment_by_id(&self, payment_id: &str) -> Option<&Payment> {
        self.payments.iter().find(|p| p.payment_id == payment_id)
    }

    pub fn payment_by_id_mut(&mut self, payment_id: &str) -> Option<&mut Payment> {
        self.payments.iter_mut().find(|p| p.payment_id == payment_id)
    }

    pub fn on_going_payment(&self) -> Option<&Payment> {
        self.payments.iter().find(|p| p.is_on_going())
    }

    /// An order whose every payment was rejected is cancelled. Orders that
    /// never requested a payment are left alone.
    pub fn should_cancel(&self) -> bool {
        use crate::domain::payment::PaymentState;

        !self.payments.is_empty()
            && self
                .payments
                .iter()
                .all(|p| p.state == PaymentState::Rejected)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentState;
    use chrono::Duration;

    fn create_test_order(now: DateTime<Utc>) -> Order {
        Order::new(Uuid::new_v4(), now)
    }

    fn payment_in(order: &Order, id: &str, state: PaymentState) -> Payment {
        let mut payment = Payment::new(order.id, id, 1, 10.0, order.created_at);
        payment.state = state;
        payment
    }

    #[test]
    fn test_new_order() {
        let now = Utc::now();
        let customer_id = Uuid::new_v4();

        let order = Order::new(customer_id, now);

        assert_eq!(order.customer_id, customer_id);
        assert_eq!(order.state, OrderState::Created);
        assert_eq!(order.state_updated_at, now);
        assert_eq!(order.total_items, 0);
        assert_eq!(order.total_price, 0.0);
        assert!(order.items.is_empty());
        assert!(order.payments.is_empty());
        assert_eq!(order.track_id.as_str().len(), 7);
    }

    #[test]
    fn test_add_item_updates_totals() {
        let past = Utc::now() - Duration::hours(1);
        let now = Utc::now();
        let mut order = create_test_order(past);

        order.add_item(OrderItem::new("burger", "Burger", 12.5, 2), now).unwrap();
        order.add_item(OrderItem::new("soda", "Soda", 2.5, 1), now).unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total_items, 3);
        assert_eq!(order.total_price, 27.5);
        assert_eq!(order.updated_at, now);
    }

    #[test]
    fn test_duplicate_item_is_rejected_without_touching_totals() {
        let now = Utc::now();
        let mut order = create_test_order(now);
        order.add_item(OrderItem::new("burger", "Burger", 12.5, 2), now).unwrap();

        let later = now + Duration::minutes(5);
        let result = order.add_item(OrderItem::new("burger", "Other", 1.0, 9), later);

        assert_eq!(result, Err(OrderError::ItemAlreadyExists("burger".to_string())));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total_items, 2);
        assert_eq!(order.total_price, 25.0);
        assert_eq!(order.updated_at, now);
    }

    #[test]
    fn test_invalid_item_is_rejected() {
        let now = Utc::now();
        let mut order = create_test_order(now);

        let result = order.add_item(OrderItem::new("free", "Free", 0.0, 1), now);

        assert!(matches!(result, Err(OrderError::InvalidItem { .. })));
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_item_bounds_are_enforced() {
        let now = Utc::now();
        let mut order = create_test_order(now);

        for item in [
            OrderItem::new("many", "Many", 1.0, 101),
            OrderItem::new("huge", "Huge", 1.0, i32::MAX),
            OrderItem::new("negative", "Negative", 1.0, -1),
            OrderItem::new("pricey", "Pricey", 1000.01, 1),
        ] {
            let id = item.id.clone();
            assert_eq!(order.add_item(item, now), Err(OrderError::InvalidItem { id }));
        }

        order.add_item(OrderItem::new("max", "Max", 1000.0, 100), now).unwrap();
        assert_eq!(order.total_items, 100);
        assert_eq!(order.total_price, 100_000.0);
    }

    #[test]
    fn test_calculate_totals_saturates_item_count() {
        let mut order = create_test_order(Utc::now());
        order.items = vec![
            OrderItem::new("a", "A", 1.0, i32::MAX),
            OrderItem::new("b", "B", 1.0, i32::MAX),
        ];

        order.calculate_totals();

        assert_eq!(order.total_items, i32::MAX);
    }

    #[test]
    fn test_calculate_totals_is_idempotent() {
        let now = Utc::now();
        let mut order = create_test_order(now);
        order.items = vec![
            OrderItem::new("a", "A", 1.25, 2),
            OrderItem::new("b", "B", 3.0, 3),
        ];

        order.calculate_totals();
        let once = (order.total_items, order.total_price);
        order.calculate_totals();

        assert_eq!((order.total_items, order.total_price), once);
        assert_eq!(once, (5, 11.5));
    }

    #[test]
    fn test_update_state() {
        let past = Utc::now() - Duration::hours(1);
        let now = Utc::now();
        let mut order = create_test_order(past);

        order.update_state(OrderState::Received, now).unwrap();

        assert_eq!(order.state, OrderState::Received);
        assert_eq!(order.state_updated_at, now);
        assert_eq!(order.updated_at, now);
    }

    #[test]
    fn test_update_state_rejects_illegal_transition() {
        let past = Utc::now() - Duration::hours(1);
        let mut order = create_test_order(past);

        let result = order.update_state(OrderState::Completed, Utc::now());

        assert_eq!(
            result,
            Err(OrderError::InvalidStateTransition {
                from: OrderState::Created,
                to: OrderState::Completed,
            })
        );
        assert_eq!(order.state, OrderState::Created);
        assert_eq!(order.updated_at, past);
    }

    #[test]
    fn test_update_state_to_same_state_is_noop() {
        let past = Utc::now() - Duration::hours(1);
        let mut order = create_test_order(past);
        order.state = OrderState::Received;

        order.update_state(OrderState::Received, Utc::now()).unwrap();

        assert_eq!(order.state, OrderState::Received);
        assert_eq!(order.state_updated_at, past);
        assert_eq!(order.updated_at, past);
    }

    #[test]
    fn test_can_add_items_only_while_created() {
        let mut order = create_test_order(Utc::now());
        assert!(order.can_add_items());

        for state in [OrderState::Received, OrderState::Processing, OrderState::Cancelled] {
            order.state = state;
            assert!(!order.can_add_items());
        }
    }

    #[test]
    fn test_is_completed() {
        let mut order = create_test_order(Utc::now());

        for state in OrderState::ALL {
            order.state = state;
            let expected = matches!(state, OrderState::Delivered | OrderState::Cancelled);
            assert_eq!(order.is_completed(), expected, "state {state}");
        }
    }

    #[test]
    fn test_on_going_payments() {
        let mut order = create_test_order(Utc::now());
        assert!(!order.has_on_going_payments());
        assert!(order.on_going_payment().is_none());

        order.payments.push(payment_in(&order, "p1", PaymentState::Rejected));
        assert!(!order.has_on_going_payments());

        order.payments.push(payment_in(&order, "p2", PaymentState::WaitingForApproval));
        order.payments.push(payment_in(&order, "p3", PaymentState::Approved));
        assert!(order.has_on_going_payments());
        assert_eq!(order.on_going_payment().unwrap().payment_id, "p2");
    }

    #[test]
    fn test_payment_by_id() {
        let mut order = create_test_order(Utc::now());
        order.payments.push(payment_in(&order, "p1", PaymentState::WaitingForApproval));

        assert_eq!(order.payment_by_id("p1").unwrap().payment_id, "p1");
        assert!(order.payment_by_id("missing").is_none());
    }

    #[test]
    fn test_should_cancel_without_payments() {
        let order = create_test_order(Utc::now());
        assert!(!order.should_cancel());
    }

    #[test]
    fn test_should_cancel_when_all_payments_rejected() {
        let mut order = create_test_order(Utc::now());
        for id in ["p1", "p2", "p3"] {
            order.payments.push(payment_in(&order, id, PaymentState::Rejected));
        }

        assert!(order.should_cancel());
    }

    #[test]
    fn test_should_not_cancel_with_any_other_payment() {
        for other in [PaymentState::None, PaymentState::WaitingForApproval, PaymentState::Approved] {
            let mut order = create_test_order(Utc::now());
            order.payments.push(payment_in(&order, "p1", PaymentState::Rejected));
            order.payments.push(payment_in(&order, "p2", other));

            assert!(!order.should_cancel(), "payment in {other} must block the cascade");
        }
    }
}
