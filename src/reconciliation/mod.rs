pub mod errors;
pub mod notification;
pub mod service;

pub use errors::ReconcileError;
pub use notification::{Notification, OrderOutcome, Outcome, PaymentOutcome};
pub use service::{NotificationHandler, ReconciliationService};
