pub mod api;
pub mod config;
pub mod domain;
pub mod messaging;
pub mod metrics;
pub mod reconciliation;
pub mod services;
pub mod store;
pub mod utils;
