// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Orders and payments, their state machines and invariants. Nothing in here
// performs I/O; persistence lives in `crate::store`.
//
// ============================================================================

pub mod order;
pub mod payment;

/// Canonical form used to match state names coming from other services:
/// lowercase with separators and surrounding whitespace removed.
pub(crate) fn normalize_state_name(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
