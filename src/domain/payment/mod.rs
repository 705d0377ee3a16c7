// ============================================================================
// Payment Domain
// ============================================================================
//
// Payments are owned by an order in memory but persisted as their own rows,
// addressed by payment id.
//
// ============================================================================

pub mod value_objects;
pub mod aggregate;

pub use value_objects::*;
pub use aggregate::*;
