use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::normalize_state_name;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Largest quantity a single item line may carry.
pub const MAX_ITEM_QUANTITY: i32 = 100;

/// Largest accepted unit price.
pub const MAX_UNIT_PRICE: f64 = 1000.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i32,
}

impl OrderItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_price: f64, quantity: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.unit_price > 0.0
            && self.unit_price <= MAX_UNIT_PRICE
            && (1..=MAX_ITEM_QUANTITY).contains(&self.quantity)
    }

    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Lifecycle state of an order.
///
/// The discriminants are the values persisted in the `orders.state` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    None = 0,
    Created = 1,
    Received = 2,
    Processing = 3,
    Completed = 4,
    Delivered = 5,
    Cancelled = 6,
}

impl OrderState {
    pub const ALL: [OrderState; 7] = [
        OrderState::None,
        OrderState::Created,
        OrderState::Received,
        OrderState::Processing,
        OrderState::Completed,
        OrderState::Delivered,
        OrderState::Cancelled,
    ];

    /// Forward edges of the order lifecycle. Same-state requests are not edges;
    /// callers treat them as a no-op.
    pub fn can_transition_to(self, to: OrderState) -> bool {
        use OrderState::*;

        matches!(
            (self, to),
            (None, Created)
                | (Created, Received)
                | (Created, Cancelled)
                | (Received, Processing)
                | (Received, Cancelled)
                | (Processing, Completed)
                | (Processing, Cancelled)
                | (Completed, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Cancelled)
    }

    /// Maps a state name received over the wire. Unknown names yield `None`,
    /// which no transition accepts as a target.
    pub fn from_wire(value: &str) -> Self {
        match normalize_state_name(value).as_str() {
            "created" => OrderState::Created,
            "received" => OrderState::Received,
            "processing" => OrderState::Processing,
            "completed" => OrderState::Completed,
            "delivered" => OrderState::Delivered,
            "cancelled" | "canceled" => OrderState::Cancelled,
            _ => OrderState::None,
        }
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_i16() == value)
    }

    /// The state with the next discriminant, `None` after `Cancelled`.
    pub fn successor(self) -> Option<Self> {
        Self::from_i16(self.as_i16() + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            OrderState::None => "None",
            OrderState::Created => "Created",
            OrderState::Received => "Received",
            OrderState::Processing => "Processing",
            OrderState::Completed => "Completed",
            OrderState::Delivered => "Delivered",
            OrderState::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Short code customers use to follow their order, e.g. `QWE-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

const TRACK_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TRACK_DIGITS: &[u8] = b"0123456789";

impl TrackId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut pick = |set: &[u8], n: usize| -> String {
            (0..n)
                .map(|_| set[rng.gen_range(0..set.len())] as char)
                .collect()
        };

        let letters = pick(TRACK_LETTERS, 3);
        let digits = pick(TRACK_DIGITS, 3);

        Self(format!("{letters}-{digits}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
