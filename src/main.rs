use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_reconciler::api;
use order_reconciler::config::AppConfig;
use order_reconciler::messaging::{
    KafkaQueue, NotificationConsumer, NotificationQueue, RedpandaPublisher,
};
use order_reconciler::metrics::{self, Metrics};
use order_reconciler::reconciliation::ReconciliationService;
use order_reconciler::services::{OrderService, PaymentInitiationService};
use order_reconciler::store::{OrderStore, PaymentStore, PgOrderStore, PgPaymentStore};
use order_reconciler::utils::{Clock, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    // Default to INFO, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_reconciler=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order reconciler");

    let config = AppConfig::from_env()?;

    // === 1. Database ===
    tracing::info!(max_connections = config.database_max_connections, "Connecting to Postgres...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let orders: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool.clone()));
    let payments: Arc<dyn PaymentStore> = Arc::new(PgPaymentStore::new(pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // === 3. Order API and payment publishing ===
    let publisher = RedpandaPublisher::new(&config.kafka_brokers, &config.order_payment_topic)?;
    tracing::info!(topic = %publisher.topic(), "Payment publisher ready");

    let order_service = Arc::new(OrderService::new(orders.clone(), clock.clone()));
    let payment_service = Arc::new(
        PaymentInitiationService::new(
            orders.clone(),
            payments.clone(),
            Arc::new(publisher),
            clock.clone(),
        )
        .with_metrics(metrics.clone()),
    );

    // Both HTTP servers share one actix system on a dedicated thread.
    let metrics_registry = Arc::new(metrics.registry().clone());
    let (metrics_port, api_port) = (config.metrics_port, config.api_port);
    std::thread::spawn(move || {
        let system = actix_web::rt::System::new();
        let servers = async move {
            tokio::try_join!(
                metrics::start_metrics_server(metrics_registry, metrics_port),
                api::start_api_server(order_service, payment_service, api_port),
            )
        };
        if let Err(e) = system.block_on(servers) {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    // === 4. Reconciliation ===
    let service = ReconciliationService::new(orders, payments, clock).with_metrics(metrics.clone());

    // === 5. Update queue ===
    let queue = KafkaQueue::new(
        &config.kafka_brokers,
        &config.kafka_group_id,
        &config.update_order_queue,
    )?;
    queue.resolve().await?;

    let consumer = NotificationConsumer::new(
        Arc::new(queue),
        Arc::new(service),
        config.consumer_config(),
    )
    .with_metrics(metrics);

    // === 6. Run until Ctrl-C ===
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_task = tokio::spawn(async move { consumer.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested, finishing in-flight batch");
    shutdown_tx.send(true)?;

    consumer_task.await?;
    pool.close().await;

    tracing::info!("👋 Order reconciler stopped");
    Ok(())
}
