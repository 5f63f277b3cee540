use anyhow::{anyhow, Result};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig};
use common::AppConfig;
use order_service::{build_router, AppState};
use std::net::SocketAddr;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();

    init_telemetry(TelemetryConfig::for_service("order-service", &config))
        .map_err(|e| anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Starting order service...");
    tracing::info!(
        "Distributed tracing: {}",
        if config.enable_jaeger { "enabled" } else { "disabled" }
    );
    tracing::info!("Configuration:");
    tracing::info!("  Redis URL: {}", config.redis.url);
    tracing::info!("  Cache TTL: {} seconds", config.redis.order_ttl_secs);
    tracing::info!("  Kafka brokers: {}", config.kafka.brokers);
    tracing::info!("  Batch workers: {}", config.batch.workers);
    tracing::info!("  Port: {}", config.port);

    let state = AppState::new(&config).await?;
    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Order service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    // let queued notifications go out before exiting
    if tokio::time::timeout(Duration::from_secs(10), state.orders.tasks().wait_idle())
        .await
        .is_err()
    {
        tracing::warn!(
            pending = state.orders.tasks().in_flight(),
            "Shutting down with background tasks still running"
        );
    }

    shutdown_telemetry();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
