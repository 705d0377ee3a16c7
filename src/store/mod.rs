// ============================================================================
// Persistence - Order and Payment Stores
// ============================================================================
//
// Orders and payments are persisted independently. Each call is atomic on its
// own; nothing spans both stores.
//
// ============================================================================

mod errors;
mod filter;
mod postgres;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, TrackId};
use crate::domain::payment::Payment;

pub use errors::StoreError;
pub use filter::{OrderFilter, OrderPage, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use postgres::{PgOrderStore, PgPaymentStore};

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts the order and its item lines in one transaction.
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    /// Loads the order with its items and every payment, oldest payment first.
    async fn get_by_id(&self, id: Uuid) -> Result<Order, StoreError>;

    async fn get_by_track_id(&self, track_id: &TrackId) -> Result<Order, StoreError>;

    /// Persists state and timestamps. Item lines are replaced only when
    /// `rewrite_items` is set. Fails with `OrderNotFound` when no row matched.
    async fn update(&self, order: &Order, rewrite_items: bool) -> Result<(), StoreError>;

    /// Lists matching orders oldest first, one page at a time. `total` counts
    /// every match, not just the returned page.
    async fn get_all(
        &self,
        pagination: Pagination,
        filter: &OrderFilter,
    ) -> Result<OrderPage, StoreError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create(&self, payment: &Payment) -> Result<(), StoreError>;

    /// Persists state and `updated_at`, matched by payment id. Fails with
    /// `PaymentNotFound` when no row matched.
    async fn update(&self, payment: &Payment) -> Result<(), StoreError>;
}
