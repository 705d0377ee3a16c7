use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, TrackId};
use crate::domain::payment::Payment;
use super::{OrderFilter, OrderPage, OrderStore, Pagination, PaymentStore, StoreError};

// ============================================================================
// In-Memory Stores (tests)
// ============================================================================
//
// Orders and payments live in one shared map so that a payment update is
// visible on the next order read, the same way the Postgres stores behave.
// Every write is also appended to a log the tests assert on.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    OrderCreated(Order),
    OrderUpdated { order: Order, rewrite_items: bool },
    PaymentCreated(Payment),
    PaymentUpdated(Payment),
}

#[derive(Default)]
struct State {
    orders: HashMap<Uuid, Order>,
    writes: Vec<Write>,
    fail_order_updates: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(order: Order) -> Self {
        let store = Self::new();
        store.insert(order);
        store
    }

    /// Seeds an order without recording a write.
    pub fn insert(&self, order: Order) {
        self.state.lock().unwrap().orders.insert(order.id, order);
    }

    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.state.lock().unwrap().orders.get(&id).cloned()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn order_updates(&self) -> Vec<(Order, bool)> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::OrderUpdated { order, rewrite_items } => Some((order, rewrite_items)),
                _ => None,
            })
            .collect()
    }

    pub fn payment_updates(&self) -> Vec<Payment> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::PaymentUpdated(payment) => Some(payment),
                _ => None,
            })
            .collect()
    }

    pub fn fail_order_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_order_updates = fail;
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.orders.insert(order.id, order.clone());
        state.writes.push(Write::OrderCreated(order.clone()));
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order, StoreError> {
        self.order(id)
            .ok_or_else(|| StoreError::OrderNotFound(id.to_string()))
    }

    async fn get_by_track_id(&self, track_id: &TrackId) -> Result<Order, StoreError> {
        let state = self.state.lock().unwrap();
        state
            .orders
            .values()
            .find(|o| &o.track_id == track_id)
            .cloned()
            .ok_or_else(|| StoreError::OrderNotFound(track_id.to_string()))
    }

    async fn update(&self, order: &Order, rewrite_items: bool) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_order_updates {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::OrderNotFound(order.id.to_string()))?;

        stored.state = order.state;
        stored.state_updated_at = order.state_updated_at;
        stored.updated_at = order.updated_at;
        if rewrite_items {
            stored.items = order.items.clone();
            stored.calculate_totals();
        }

        state.writes.push(Write::OrderUpdated {
            order: order.clone(),
            rewrite_items,
        });
        Ok(())
    }

    async fn get_all(
        &self,
        pagination: Pagination,
        filter: &OrderFilter,
    ) -> Result<OrderPage, StoreError> {
        let state = self.state.lock().unwrap();

        let mut matching: Vec<&Order> = state.orders.values().filter(|o| filter.matches(o)).collect();
        matching.sort_by_key(|o| (o.created_at, o.id));

        let orders = matching
            .iter()
            .skip(pagination.offset() as usize)
            .take(pagination.size() as usize)
            .map(|o| (*o).clone())
            .collect();

        Ok(OrderPage {
            total: matching.len() as i64,
            orders,
        })
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn create(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(order) = state.orders.get_mut(&payment.order_id) {
            order.payments.push(payment.clone());
        }
        state.writes.push(Write::PaymentCreated(payment.clone()));
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .orders
            .values_mut()
            .flat_map(|o| o.payments.iter_mut())
            .find(|p| p.payment_id == payment.payment_id)
            .ok_or_else(|| StoreError::PaymentNotFound(payment.payment_id.clone()))?;

        stored.state = payment.state;
        stored.updated_at = payment.updated_at;

        state.writes.push(Write::PaymentUpdated(payment.clone()));
        Ok(())
    }
}
