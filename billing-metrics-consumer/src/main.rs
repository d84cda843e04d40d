use std::future::ready;

use axum::{routing::get, Router};
use envconfig::Envconfig;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use billing_metrics_consumer::config::Config;
use billing_metrics_consumer::consumer::BillingConsumerLoop;
use billing_metrics_consumer::serve::{serve, setup_metrics_routes};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy()
            .add_directive("rdkafka=warn".parse().unwrap()),
    );
    tracing_subscriber::registry().with(log_layer).init();
}

pub async fn index() -> &'static str {
    "billing metrics consumer"
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    setup_tracing();
    info!("Starting billing metrics consumer...");

    let config = Config::init_from_env()?;
    info!(
        topic = config.kafka_consumer_topic,
        group_id = config.kafka_consumer_group,
        outcomes_topic = config.outcomes_topic,
        transaction_metric_id = config.transaction_metric_id,
        "Configuration loaded"
    );

    // Health check server
    let bind = config.bind_address();
    let health_router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(|| ready("ok")));
    let health_router = setup_metrics_routes(health_router);

    tokio::task::spawn(async move {
        serve(health_router, &bind)
            .await
            .expect("failed to start health server");
    });

    // Shutdown signal
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // Consumer loop
    let consumer_loop = BillingConsumerLoop::new(&config).await?;
    consumer_loop.run(shutdown_rx).await?;

    info!("Billing metrics consumer shut down");
    Ok(())
}
