use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use crate::services::{OrderService, PaymentInitiationService};
use super::routes::configure;

/// Serves the order API. Like the metrics endpoint, this must run inside an
/// actix system.
pub async fn start_api_server(
    orders: Arc<OrderService>,
    payments: Arc<PaymentInitiationService>,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!(port, "🌐 Starting order API on http://0.0.0.0:{}", port);

    let orders = web::Data::from(orders);
    let payments = web::Data::from(payments);

    HttpServer::new(move || {
        App::new()
            .app_data(orders.clone())
            .app_data(payments.clone())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
