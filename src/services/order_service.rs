use std::sync::Arc;

use uuid::Uuid;

use crate::domain::order::{Order, OrderError, OrderItem, TrackId};
use crate::store::{OrderFilter, OrderPage, OrderStore, Pagination, StoreError};
use crate::utils::Clock;
use super::errors::ServiceError;

/// Synchronous order operations: creation, item changes and lookups.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderStore>, clock: Arc<dyn Clock>) -> Self {
        Self { orders, clock }
    }

    /// A customer may only hold one open order at a time; anything from
    /// `Created` up to, but not including, `Delivered` counts as open.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, customer_id: Uuid) -> Result<Order, ServiceError> {
        let open = self
            .orders
            .get_all(Pagination::new(1, 1), &OrderFilter::open_orders(customer_id))
            .await?;
        if open.total > 0 {
            return Err(StoreError::OrderAlreadyExists(customer_id).into());
        }

        let order = Order::new(customer_id, self.clock.now());
        self.orders.create(&order).await?;

        tracing::info!(
            order_id = %order.id,
            track_id = %order.track_id,
            "Order created"
        );

        Ok(order)
    }

    /// Adds every item or none: the order is only persisted when all items
    /// were accepted.
    #[tracing::instrument(skip(self, items), fields(count = items.len()))]
    pub async fn add_items(
        &self,
        order_id: Uuid,
        items: Vec<OrderItem>,
    ) -> Result<Order, ServiceError> {
        let mut order = self.orders.get_by_id(order_id).await?;

        if order.is_completed() {
            return Err(OrderError::AlreadyCompleted.into());
        }
        if !order.can_add_items() {
            return Err(OrderError::CannotAddItems(order.state).into());
        }
        if order.has_on_going_payments() {
            return Err(OrderError::HasOnGoingPayments.into());
        }

        let now = self.clock.now();
        for item in items {
            order.add_item(item, now)?;
        }

        self.orders.update(&order, true).await?;

        tracing::info!(
            order_id = %order.id,
            total_items = order.total_items,
            total_price = order.total_price,
            "Order items updated"
        );

        Ok(order)
    }

    pub async fn get_by_id(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        Ok(self.orders.get_by_id(order_id).await?)
    }

    pub async fn get_by_track_id(&self, track_id: &TrackId) -> Result<Order, ServiceError> {
        Ok(self.orders.get_by_track_id(track_id).await?)
    }

    pub async fn get_all(
        &self,
        pagination: Pagination,
        filter: &OrderFilter,
    ) -> Result<OrderPage, ServiceError> {
        Ok(self.orders.get_all(pagination, filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderState;
    use crate::domain::payment::Payment;
    use crate::store::memory::{InMemoryStore, Write};
    use crate::utils::FixedClock;
    use chrono::Utc;

    fn service(store: &InMemoryStore) -> OrderService {
        OrderService::new(Arc::new(store.clone()), Arc::new(FixedClock(Utc::now())))
    }

    fn burger() -> OrderItem {
        OrderItem::new("burger", "Burger", 12.5, 2)
    }

    #[tokio::test]
    async fn test_create_order() {
        let store = InMemoryStore::new();
        let customer_id = Uuid::new_v4();

        let order = service(&store).create_order(customer_id).await.unwrap();

        assert_eq!(order.customer_id, customer_id);
        assert_eq!(order.state, OrderState::Created);
        assert_eq!(store.writes(), vec![Write::OrderCreated(order.clone())]);
    }

    #[tokio::test]
    async fn test_create_order_refused_while_one_is_open() {
        let store = InMemoryStore::new();
        let customer_id = Uuid::new_v4();
        service(&store).create_order(customer_id).await.unwrap();

        let result = service(&store).create_order(customer_id).await;

        assert!(matches!(
            result,
            Err(ServiceError::Store(StoreError::OrderAlreadyExists(id))) if id == customer_id
        ));
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_create_order_allowed_after_previous_was_delivered() {
        let store = InMemoryStore::new();
        let customer_id = Uuid::new_v4();
        let mut previous = Order::new(customer_id, Utc::now());
        previous.state = OrderState::Delivered;
        store.insert(previous);

        let order = service(&store).create_order(customer_id).await.unwrap();

        assert_eq!(order.customer_id, customer_id);
    }

    #[tokio::test]
    async fn test_add_items_rewrites_item_lines() {
        let order = Order::new(Uuid::new_v4(), Utc::now());
        let store = InMemoryStore::with_order(order.clone());

        let updated = service(&store)
            .add_items(order.id, vec![burger(), OrderItem::new("soda", "Soda", 2.5, 1)])
            .await
            .unwrap();

        assert_eq!(updated.total_items, 3);
        assert_eq!(updated.total_price, 27.5);
        let updates = store.order_updates();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].1);
        assert_eq!(store.order(order.id).unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn test_add_items_is_all_or_nothing() {
        let order = Order::new(Uuid::new_v4(), Utc::now());
        let store = InMemoryStore::with_order(order.clone());

        let result = service(&store)
            .add_items(order.id, vec![burger(), burger()])
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Order(OrderError::ItemAlreadyExists(_)))
        ));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_add_items_rules() {
        let cases = [
            (OrderState::Cancelled, false, OrderError::AlreadyCompleted),
            (OrderState::Received, false, OrderError::CannotAddItems(OrderState::Received)),
            (OrderState::Created, true, OrderError::HasOnGoingPayments),
        ];

        for (state, with_payment, expected) in cases {
            let mut order = Order::new(Uuid::new_v4(), Utc::now());
            order.state = state;
            if with_payment {
                order.payments.push(Payment::new(order.id, "pay-1", 1, 10.0, Utc::now()));
            }
            let store = InMemoryStore::with_order(order.clone());

            let result = service(&store).add_items(order.id, vec![burger()]).await;

            match result {
                Err(ServiceError::Order(err)) => assert_eq!(err, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
            assert!(store.writes().is_empty());
        }
    }

    #[tokio::test]
    async fn test_create_order_refused_while_one_is_completed() {
        let store = InMemoryStore::new();
        let customer_id = Uuid::new_v4();
        let mut previous = Order::new(customer_id, Utc::now());
        previous.state = OrderState::Completed;
        store.insert(previous);

        let result = service(&store).create_order(customer_id).await;

        assert!(matches!(
            result,
            Err(ServiceError::Store(StoreError::OrderAlreadyExists(_)))
        ));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_add_items_rejects_oversized_quantity() {
        let order = Order::new(Uuid::new_v4(), Utc::now());
        let store = InMemoryStore::with_order(order.clone());

        let result = service(&store)
            .add_items(order.id, vec![burger(), OrderItem::new("bulk", "Bulk", 1.0, i32::MAX)])
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Order(OrderError::InvalidItem { id })) if id == "bulk"
        ));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_pages_oldest_first() {
        let store = InMemoryStore::new();
        let customer_id = Uuid::new_v4();
        let start = Utc::now() - chrono::Duration::hours(1);

        let mut ids = Vec::new();
        for (minutes, state) in [
            (0, OrderState::Delivered),
            (1, OrderState::Cancelled),
            (2, OrderState::Received),
        ] {
            let mut order = Order::new(customer_id, start + chrono::Duration::minutes(minutes));
            order.state = state;
            ids.push(order.id);
            store.insert(order);
        }
        store.insert(Order::new(Uuid::new_v4(), start));
        let service = service(&store);

        let first = service
            .get_all(Pagination::new(1, 2), &OrderFilter::for_customer(customer_id))
            .await
            .unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.orders.iter().map(|o| o.id).collect::<Vec<_>>(), &ids[..2]);

        let second = service
            .get_all(Pagination::new(2, 2), &OrderFilter::for_customer(customer_id))
            .await
            .unwrap();
        assert_eq!(second.orders.iter().map(|o| o.id).collect::<Vec<_>>(), &ids[2..]);

        let cancelled = OrderFilter::for_customer(customer_id).in_state(OrderState::Cancelled);
        let page = service.get_all(Pagination::default(), &cancelled).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.orders[0].id, ids[1]);

        let everyone = service.get_all(Pagination::default(), &OrderFilter::default()).await.unwrap();
        assert_eq!(everyone.total, 4);
    }

    #[tokio::test]
    async fn test_lookups() {
        let order = Order::new(Uuid::new_v4(), Utc::now());
        let store = InMemoryStore::with_order(order.clone());
        let service = service(&store);

        assert_eq!(service.get_by_id(order.id).await.unwrap(), order);
        assert_eq!(service.get_by_track_id(&order.track_id).await.unwrap(), order);
        assert!(matches!(
            service.get_by_id(Uuid::new_v4()).await,
            Err(ServiceError::Store(StoreError::OrderNotFound(_)))
        ));
    }
}
