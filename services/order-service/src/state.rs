use anyhow::Result;
use clients::{HttpInventoryChecker, HttpNotificationDispatcher, HttpPaymentAuthority};
use common::config::BatchConfig;
use common::{AppConfig, MetricsRecorder, PrometheusMetrics};
use messaging::KafkaEventPublisher;
use orchestration::{BatchProcessor, OrderDependencies, OrderService, OrderServiceConfig};
use persistence::{PostgresOrderRepository, RedisCache};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub batch: Arc<BatchProcessor>,
    pub batch_config: BatchConfig,
    pub metrics: Arc<PrometheusMetrics>,
}

impl AppState {
    /// Connect to every backing service named in `config`
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let metrics = Arc::new(PrometheusMetrics::new()?);
        let recorder: Arc<dyn MetricsRecorder> = metrics.clone();

        info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database_url())
            .await?;
        let repository = PostgresOrderRepository::new(pool);
        repository.ensure_schema().await?;
        info!("Database connected");

        info!(url = %config.redis.url, "Connecting to Redis...");
        let cache = RedisCache::new(&config.redis.url).await?;
        info!("Redis connected");

        info!(brokers = %config.kafka.brokers, "Creating Kafka event publisher");
        let publisher = KafkaEventPublisher::new(&config.kafka.brokers)?;

        let services = &config.services;
        let timeout = services.request_timeout();

        let deps = OrderDependencies {
            repository: Arc::new(repository),
            cache: Arc::new(cache),
            inventory: Arc::new(HttpInventoryChecker::new(
                &services.inventory_url,
                timeout,
                recorder.clone(),
            )),
            payments: Arc::new(HttpPaymentAuthority::new(
                &services.payment_url,
                timeout,
                recorder.clone(),
            )),
            publisher: Arc::new(publisher),
            notifications: Arc::new(HttpNotificationDispatcher::new(
                &services.notification_url,
                timeout,
                recorder.clone(),
            )),
            metrics: recorder,
        };

        let orders = Arc::new(OrderService::new(deps, OrderServiceConfig::from_app(config)));
        Ok(Self::from_parts(orders, metrics, config.batch.clone()))
    }

    /// Assemble state around an already wired service
    pub fn from_parts(
        orders: Arc<OrderService>,
        metrics: Arc<PrometheusMetrics>,
        batch_config: BatchConfig,
    ) -> Self {
        let batch = Arc::new(BatchProcessor::new(orders.clone(), metrics.clone()));

        Self {
            orders,
            batch,
            batch_config,
            metrics,
        }
    }
}
