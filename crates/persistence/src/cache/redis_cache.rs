use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info};

use super::Cache;
use crate::CacheError;

/// Redis-backed cache
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Create new Redis cache
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Redis cache connected: {}", redis_url);
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = self.conn.clone().get(key).await?;
        debug!(key = %key, hit = value.is_some(), "Redis lookup");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // SET EX rejects zero
        let seconds = ttl.as_secs().max(1);
        self.conn
            .clone()
            .set_ex::<_, _, ()>(key, value, seconds)
            .await?;

        debug!(key = %key, ttl_secs = seconds, "Cached value");
        Ok(())
    }
}
