pub mod errors;
pub mod order_service;
pub mod payment_initiation;

pub use errors::ServiceError;
pub use order_service::OrderService;
pub use payment_initiation::{PayRequest, PayRequestItem, PaymentInitiationService};
