use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::normalize_state_name;

// ============================================================================
// Payment Value Objects
// ============================================================================

/// State of a single payment attempt, as decided by the payment gateway.
///
/// The discriminants are the values persisted in the `order_payments.state` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentState {
    None = 0,
    WaitingForApproval = 1,
    Approved = 2,
    Rejected = 3,
}

impl PaymentState {
    pub const ALL: [PaymentState; 4] = [
        PaymentState::None,
        PaymentState::WaitingForApproval,
        PaymentState::Approved,
        PaymentState::Rejected,
    ];

    /// The gateway is authoritative for payment outcomes, so every move between
    /// known states is accepted. Only the unknown sentinel is refused as a target.
    pub fn can_transition_to(self, to: PaymentState) -> bool {
        to != PaymentState::None
    }

    pub fn is_on_going(self) -> bool {
        matches!(self, PaymentState::WaitingForApproval | PaymentState::Approved)
    }

    pub fn from_wire(value: &str) -> Self {
        match normalize_state_name(value).as_str() {
            "waitingforapproval" => PaymentState::WaitingForApproval,
            "approved" => PaymentState::Approved,
            "rejected" => PaymentState::Rejected,
            _ => PaymentState::None,
        }
    }

    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_i16() == value)
    }

    pub fn title(self) -> &'static str {
        match self {
            PaymentState::None => "None",
            PaymentState::WaitingForApproval => "WaitingForApproval",
            PaymentState::Approved => "Approved",
            PaymentState::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
