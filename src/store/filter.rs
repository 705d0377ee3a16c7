use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{Order, OrderState};

// ============================================================================
// Listing Queries - Pagination and Filters
// ============================================================================

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    size: u32,
}

impl Pagination {
    /// Page is clamped to at least 1 and size to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Which orders a listing returns. States form a half-open range
/// `[state_from, state_to)` over the state discriminants; a missing bound is
/// unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub state_from: Option<OrderState>,
    pub state_to: Option<OrderState>,
}

impl OrderFilter {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    /// Orders still moving through the kitchen: created up to, but not
    /// including, delivered.
    pub fn open_orders(customer_id: Uuid) -> Self {
        Self::for_customer(customer_id).with_states(OrderState::Created, Some(OrderState::Delivered))
    }

    pub fn with_states(mut self, from: OrderState, to: Option<OrderState>) -> Self {
        self.state_from = Some(from);
        self.state_to = to;
        self
    }

    /// Restricts the listing to exactly one state.
    pub fn in_state(self, state: OrderState) -> Self {
        self.with_states(state, state.successor())
    }

    pub(crate) fn state_bounds(&self) -> (i16, i16) {
        (
            self.state_from.map_or(i16::MIN, OrderState::as_i16),
            self.state_to.map_or(i16::MAX, OrderState::as_i16),
        )
    }

    pub fn matches(&self, order: &Order) -> bool {
        let (from, to) = self.state_bounds();
        let state = order.state.as_i16();

        self.customer_id.map_or(true, |id| id == order.customer_id) && state >= from && state < to
    }
}

/// A page of orders plus the number of orders matching the filter overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPage {
    pub total: i64,
    pub orders: Vec<Order>,
}
