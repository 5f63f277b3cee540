use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Build database URL from configuration
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "orders".to_string(),
            max_connections: 10,
        }
    }
}

/// Redis cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    /// How long a cached order stays valid
    pub order_ttl_secs: u64,
}

impl RedisConfig {
    pub fn order_ttl(&self) -> Duration {
        Duration::from_secs(self.order_ttl_secs)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            order_ttl_secs: 30 * 60,
        }
    }
}

/// Kafka publisher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    pub brokers: String,
    pub orders_topic: String,
    pub created_routing_key: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            orders_topic: "orders".to_string(),
            created_routing_key: "order.created".to_string(),
        }
    }
}

/// Base URLs of the services the order service depends on
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    pub inventory_url: String,
    pub payment_url: String,
    pub notification_url: String,
    pub request_timeout_secs: u64,
}

impl ServicesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            inventory_url: "http://localhost:8082/api/v1".to_string(),
            payment_url: "http://localhost:8083/api/v1".to_string(),
            notification_url: "http://localhost:8084/api/v1".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Worker pool settings for batch order creation
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub workers: usize,
    pub timeout_secs: u64,
}

impl BatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            timeout_secs: 30,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub database_url: Option<String>,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub services: ServicesConfig,
    pub batch: BatchConfig,
    pub port: u16,
    pub log_level: String,
    pub enable_jaeger: bool,
    pub jaeger_endpoint: Option<String>,
}

impl AppConfig {
    /// Load configuration from the environment (and `.env`), keeping defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::defaults();

        Self {
            database: defaults.database,
            database_url: std::env::var("DATABASE_URL").ok(),
            redis: RedisConfig {
                url: env_or("REDIS_URL", defaults.redis.url),
                order_ttl_secs: env_parse("CACHE_TTL_SECONDS", defaults.redis.order_ttl_secs),
            },
            kafka: KafkaConfig {
                brokers: env_or("KAFKA_BROKERS", defaults.kafka.brokers),
                orders_topic: env_or("KAFKA_ORDERS_TOPIC", defaults.kafka.orders_topic),
                created_routing_key: env_or(
                    "ORDER_CREATED_ROUTING_KEY",
                    defaults.kafka.created_routing_key,
                ),
            },
            services: ServicesConfig {
                inventory_url: env_or("INVENTORY_SERVICE_URL", defaults.services.inventory_url),
                payment_url: env_or("PAYMENT_SERVICE_URL", defaults.services.payment_url),
                notification_url: env_or(
                    "NOTIFICATION_SERVICE_URL",
                    defaults.services.notification_url,
                ),
                request_timeout_secs: env_parse(
                    "SERVICE_TIMEOUT_SECONDS",
                    defaults.services.request_timeout_secs,
                ),
            },
            batch: BatchConfig {
                workers: env_parse("BATCH_WORKERS", defaults.batch.workers),
                timeout_secs: env_parse("BATCH_TIMEOUT_SECONDS", defaults.batch.timeout_secs),
            },
            port: env_parse("PORT", defaults.port),
            log_level: env_or("RUST_LOG", defaults.log_level),
            enable_jaeger: env_parse("ENABLE_JAEGER", defaults.enable_jaeger),
            jaeger_endpoint: std::env::var("JAEGER_ENDPOINT").ok(),
        }
    }

    /// Explicit `DATABASE_URL` wins over the assembled one
    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| self.database.url())
    }

    fn defaults() -> Self {
        Self {
            port: 8080,
            log_level: "info".to_string(),
            ..Default::default()
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
